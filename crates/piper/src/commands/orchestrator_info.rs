use crate::errors::CliError;
use piper_orchestrator::{OrchestratorInfo, OrchestratorProvider, Provider};
use std::io::Write;
use tracing::instrument;

#[instrument(skip_all, fields(json = json))]
pub fn execute(provider: &Provider, json: bool, out: &mut impl Write) -> Result<(), CliError> {
    let info = provider.info();
    if json {
        let rendered = serde_json::to_string_pretty(&info)
            .map_err(|e| CliError::step_failed("orchestratorInfo", e.into()))?;
        writeln!(out, "{rendered}").map_err(CliError::output)?;
    } else {
        out.write_all(render_text(&info).as_bytes())
            .map_err(CliError::output)?;
    }
    Ok(())
}

fn render_text(info: &OrchestratorInfo) -> String {
    let mut lines = vec![
        format!("orchestrator: {}", info.orchestrator),
        format!("branch: {}", info.branch),
        format!("reference: {}", info.reference),
        format!("commit: {}", info.commit),
        format!("repoUrl: {}", info.repo_url),
        format!("buildUrl: {}", info.build_url),
        format!("buildId: {}", info.build_id),
        format!("jobUrl: {}", info.job_url),
        format!("jobName: {}", info.job_name),
        format!("stageName: {}", info.stage_name),
        format!("buildReason: {}", info.build_reason),
        format!("isPullRequest: {}", info.is_pull_request),
    ];
    if let Some(pr) = &info.pull_request {
        lines.push(format!("pullRequest.branch: {}", pr.branch));
        lines.push(format!("pullRequest.base: {}", pr.base));
        lines.push(format!("pullRequest.key: {}", pr.key));
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
