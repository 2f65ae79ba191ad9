//! `[[jobs]]` entries to scheduler jobs.

use anyhow::{anyhow, bail};
use kubecron_catalog::Catalog;
use kubecron_core::config::JobConfig;
use kubecron_scheduler::JobSpec;

/// Build the job a config entry describes.
///
/// A `catalog` entry borrows the command text, and the description unless
/// one is given, from the catalog command of that name.
pub fn resolve_job(job: &JobConfig, catalog: &Catalog) -> anyhow::Result<JobSpec> {
    let (command, description) = match (&job.command, &job.catalog) {
        (Some(command), None) => (command.clone(), job.description.clone()),
        (None, Some(name)) => {
            let found = catalog
                .find(name)
                .ok_or_else(|| anyhow!("job '{}': no catalog command named '{name}'", job.name))?;
            let description = if job.description.is_empty() {
                found.description.clone()
            } else {
                job.description.clone()
            };
            (found.command.clone(), description)
        }
        (Some(_), Some(_)) => bail!("job '{}': set either command or catalog, not both", job.name),
        (None, None) => bail!("job '{}': needs a command or a catalog entry", job.name),
    };

    let mut builder = JobSpec::builder(&job.name, command, &job.expression)
        .description(description)
        .recurring(job.recurring);
    if let Some(email) = &job.email {
        builder = builder.email(email);
    }
    if let Some(shell) = &job.shell {
        builder = builder.shell(shell);
    }
    Ok(builder.build())
}
