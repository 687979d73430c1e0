//! Environment isolation for provider tests.

/// Every variable read by detection or by a provider.
pub const CI_VARIABLES: &[&str] = &[
    // detection
    "AZURE_HTTP_USER_AGENT",
    "TF_BUILD",
    "GITHUB_ACTION",
    "GITHUB_ACTIONS",
    "JENKINS_HOME",
    "JENKINS_URL",
    "GITLAB_CI",
    // GitHub Actions
    "GITHUB_REF",
    "GITHUB_HEAD_REF",
    "GITHUB_BASE_REF",
    "GITHUB_SHA",
    "GITHUB_SERVER_URL",
    "GITHUB_REPOSITORY",
    "GITHUB_RUN_ID",
    "GITHUB_JOB",
    "GITHUB_EVENT_NAME",
    "GITHUB_WORKFLOW_REF",
    "GITHUB_API_URL",
    "GITHUB_TOKEN",
    // Jenkins
    "BRANCH_NAME",
    "CHANGE_ID",
    "CHANGE_BRANCH",
    "CHANGE_TARGET",
    "GIT_COMMIT",
    "GIT_URL",
    "BUILD_URL",
    "BUILD_ID",
    "JOB_URL",
    "JOB_NAME",
    "STAGE_NAME",
    // Azure DevOps
    "BUILD_SOURCEBRANCH",
    "BUILD_SOURCEVERSION",
    "BUILD_REPOSITORY_URI",
    "BUILD_BUILDID",
    "BUILD_REASON",
    "SYSTEM_COLLECTIONURI",
    "SYSTEM_TEAMPROJECT",
    "SYSTEM_DEFINITIONID",
    "SYSTEM_JOBDISPLAYNAME",
    "SYSTEM_STAGEDISPLAYNAME",
    "SYSTEM_PULLREQUEST_SOURCEBRANCH",
    "SYSTEM_PULLREQUEST_TARGETBRANCH",
    "SYSTEM_PULLREQUEST_PULLREQUESTID",
    "SYSTEM_PULLREQUEST_PULLREQUESTNUMBER",
    // GitLab
    "CI_COMMIT_TAG",
    "CI_COMMIT_BRANCH",
    "CI_COMMIT_REF_NAME",
    "CI_COMMIT_SHA",
    "CI_PROJECT_URL",
    "CI_PIPELINE_URL",
    "CI_PIPELINE_ID",
    "CI_PIPELINE_SOURCE",
    "CI_JOB_URL",
    "CI_JOB_NAME",
    "CI_JOB_STAGE",
    "CI_MERGE_REQUEST_IID",
    "CI_MERGE_REQUEST_SOURCE_BRANCH_NAME",
    "CI_MERGE_REQUEST_TARGET_BRANCH_NAME",
];

/// Run `f` with every CI variable unset except `vars`.
pub fn with_ci_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let mut env: Vec<(&str, Option<&str>)> =
        CI_VARIABLES.iter().map(|name| (*name, None)).collect();
    for &(name, value) in vars {
        match env.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = Some(value),
            None => env.push((name, Some(value))),
        }
    }
    temp_env::with_vars(env, f)
}
