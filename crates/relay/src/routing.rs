//! Push-event routing: which r10k deployment a push should trigger.
//!
//! The module name is inferred from the repository name on the common (but
//! assumed) convention that:
//!
//! 1. the module name matches the repository suffix (module `soe` lives in
//!    repository `puppet-soe`);
//! 2. `-` separates the organisation prefix from the module name;
//! 3. the environment repository is called `puppet`, or ends in `-puppet` or
//!    `-environment`.
//!
//! Repository names arrive from an unauthenticated webhook, so the inferred
//! name must pass [`ModuleName::parse`] before it goes anywhere near a command
//! line. Only repositories already configured in r10k can actually be
//! deployed; anything else is discarded by r10k itself.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Module names accepted for a single-module deployment.
static MODULE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]*$").expect("module name pattern is valid"));

/// Module names that identify the environment (control) repository.
const ENVIRONMENT_MODULES: [&str; 2] = ["puppet", "environment"];

/// Repository name that always identifies the environment repository.
const ENVIRONMENT_REPOSITORY: &str = "puppet";

// ---------------------------------------------------------------------------

/// A validated, alphanumeric-only Puppet module name.
///
/// May be empty: a repository name ending in `-` yields an empty candidate,
/// which still matches the pattern. Safe to pass as a command-line argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleName(String);

impl ModuleName {
    /// Validates `candidate`, returning `None` unless it matches
    /// `^[A-Za-z0-9]*$`.
    pub fn parse(candidate: &str) -> Option<Self> {
        if MODULE_NAME.is_match(candidate) {
            Some(Self(candidate.to_string()))
        } else {
            None
        }
    }

    /// Returns the module name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name is empty (the repository name ended in `-`).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ModuleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the last `-`-delimited segment of `repo_name`.
///
/// A name with no `-` is returned whole; a name ending in `-` yields `""`.
pub fn module_candidate(repo_name: &str) -> &str {
    repo_name.rsplit('-').next().unwrap_or(repo_name)
}

// ---------------------------------------------------------------------------

/// The deployment a push event resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Redeploy every environment and its modules (the heavy run).
    Environment,
    /// Redeploy one module in every environment.
    Module(ModuleName),
    /// The inferred module name is unsafe; nothing is deployed.
    Rejected {
        /// The raw candidate that failed validation.
        candidate: String,
    },
}

/// Routes a repository name to a [`DeployPlan`]. First match wins:
///
/// 1. candidate is `puppet` or `environment`, or the whole name is `puppet`
///    → [`DeployPlan::Environment`];
/// 2. candidate is alphanumeric (or empty) → [`DeployPlan::Module`];
/// 3. otherwise → [`DeployPlan::Rejected`].
pub fn plan_deployment(repo_name: &str) -> DeployPlan {
    let candidate = module_candidate(repo_name);

    if ENVIRONMENT_MODULES.contains(&candidate) || repo_name == ENVIRONMENT_REPOSITORY {
        return DeployPlan::Environment;
    }

    match ModuleName::parse(candidate) {
        Some(module) => DeployPlan::Module(module),
        None => DeployPlan::Rejected {
            candidate: candidate.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_is_suffix_after_last_dash() {
        assert_eq!(module_candidate("puppet-soe"), "soe");
        assert_eq!(module_candidate("acme-puppet-nginx"), "nginx");
        assert_eq!(module_candidate("standalone"), "standalone");
        assert_eq!(module_candidate("trailing-"), "");
    }

    #[test]
    fn org_module_names_yield_module() {
        for (org, module) in [("puppet", "soe"), ("acme", "ntp"), ("a-b-c", "Apache2")] {
            let repo = format!("{org}-{module}");
            assert_eq!(module_candidate(&repo), module);
            assert_eq!(
                plan_deployment(&repo),
                DeployPlan::Module(ModuleName::parse(module).expect("valid"))
            );
        }
    }

    #[test]
    fn environment_repositories_select_full_deploy() {
        assert_eq!(plan_deployment("puppet"), DeployPlan::Environment);
        assert_eq!(plan_deployment("acme-puppet"), DeployPlan::Environment);
        assert_eq!(plan_deployment("acme-environment"), DeployPlan::Environment);
        assert_eq!(plan_deployment("environment"), DeployPlan::Environment);
    }

    #[test]
    fn injection_attempts_are_rejected() {
        assert_eq!(
            plan_deployment("puppet-soe; evil"),
            DeployPlan::Rejected {
                candidate: "soe; evil".to_string()
            }
        );
        assert!(matches!(
            plan_deployment("puppet-foo;reboot"),
            DeployPlan::Rejected { .. }
        ));
        // Only the last segment is considered, so a dash inside the payload
        // shifts the candidate rather than smuggling the prefix through.
        assert_eq!(
            plan_deployment("puppet-foo; rm -rf"),
            DeployPlan::Module(ModuleName::parse("rf").expect("valid"))
        );
        assert!(matches!(plan_deployment("puppet-$(id)"), DeployPlan::Rejected { .. }));
        assert!(matches!(plan_deployment("puppet-a_b"), DeployPlan::Rejected { .. }));
        assert!(matches!(plan_deployment("puppet-soe\n"), DeployPlan::Rejected { .. }));
    }

    #[test]
    fn empty_candidate_selects_module_deploy() {
        let plan = plan_deployment("puppet-");
        let DeployPlan::Module(module) = plan else {
            panic!("expected a module deploy, got {plan:?}");
        };
        assert!(module.is_empty());
        assert_eq!(module.as_str(), "");
    }

    #[test]
    fn environment_names_are_case_sensitive() {
        assert_eq!(
            plan_deployment("acme-Puppet"),
            DeployPlan::Module(ModuleName::parse("Puppet").expect("valid"))
        );
    }
}
