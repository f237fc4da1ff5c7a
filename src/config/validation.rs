// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::fmt;

use crate::config::{GatewayConfig, ProjectConfig};

/// Errors that can occur during gateway config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// Two projects share a name; project names are globally unique
    DuplicateProjectName { project_name: String },
    /// A project has an empty signing key
    EmptySignKey { project_name: String },
    /// Two publishers in one project share a key
    DuplicatePublisherKey {
        project_name: String,
        publisher_key: String,
    },
    /// A strategy references an empty handler name
    EmptyHandler {
        project_name: String,
        applet_name: String,
    },
    /// A strategy uses an event type name that is not `ANY`
    UnknownEventType {
        project_name: String,
        applet_name: String,
        event_type: String,
    },
    /// An applet has no module path
    EmptyModulePath {
        project_name: String,
        applet_name: String,
    },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValidationError::DuplicateProjectName { project_name } => {
                write!(f, "Duplicate project name: '{}'", project_name)
            }
            ConfigValidationError::EmptySignKey { project_name } => {
                write!(f, "Project '{}' has an empty sign_key", project_name)
            }
            ConfigValidationError::DuplicatePublisherKey {
                project_name,
                publisher_key,
            } => {
                write!(
                    f,
                    "Project '{}' registers publisher key '{}' more than once",
                    project_name, publisher_key
                )
            }
            ConfigValidationError::EmptyHandler {
                project_name,
                applet_name,
            } => {
                write!(
                    f,
                    "Applet '{}' in project '{}' has a strategy with an empty handler",
                    applet_name, project_name
                )
            }
            ConfigValidationError::UnknownEventType {
                project_name,
                applet_name,
                event_type,
            } => {
                write!(
                    f,
                    "Applet '{}' in project '{}' uses unknown event type '{}'",
                    applet_name, project_name, event_type
                )
            }
            ConfigValidationError::EmptyModulePath {
                project_name,
                applet_name,
            } => {
                write!(
                    f,
                    "Applet '{}' in project '{}' has no module path",
                    applet_name, project_name
                )
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Validate the whole config, collecting every error rather than stopping at
/// the first.
pub fn validate_config(cfg: &GatewayConfig) -> Result<(), Vec<ConfigValidationError>> {
    let mut errors = Vec::new();
    let mut seen_projects = HashSet::new();

    for project in &cfg.projects {
        if !seen_projects.insert(project.name.clone()) {
            errors.push(ConfigValidationError::DuplicateProjectName {
                project_name: project.name.clone(),
            });
        }
        validate_project(project, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_project(project: &ProjectConfig, errors: &mut Vec<ConfigValidationError>) {
    if project.sign_key.is_empty() {
        errors.push(ConfigValidationError::EmptySignKey {
            project_name: project.name.clone(),
        });
    }

    let mut seen_publishers = HashSet::new();
    for publisher in &project.publishers {
        if !seen_publishers.insert(publisher.key.clone()) {
            errors.push(ConfigValidationError::DuplicatePublisherKey {
                project_name: project.name.clone(),
                publisher_key: publisher.key.clone(),
            });
        }
    }

    for applet in &project.applets {
        if applet.module.is_empty() {
            errors.push(ConfigValidationError::EmptyModulePath {
                project_name: project.name.clone(),
                applet_name: applet.name.clone(),
            });
        }
        for strategy in &applet.strategies {
            if strategy.handler.is_empty() {
                errors.push(ConfigValidationError::EmptyHandler {
                    project_name: project.name.clone(),
                    applet_name: applet.name.clone(),
                });
            }
            if strategy.event_type.resolve().is_none() {
                errors.push(ConfigValidationError::UnknownEventType {
                    project_name: project.name.clone(),
                    applet_name: applet.name.clone(),
                    event_type: format!("{:?}", strategy.event_type),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> GatewayConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn valid_config_passes() {
        let cfg = parse(
            r#"
projects:
  - name: a
    sign_key: k
    applets:
      - name: app
        module: app.wasm
        strategies:
          - event_type: ANY
            handler: start
"#,
        );
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn duplicate_project_names_are_reported() {
        let cfg = parse(
            r#"
projects:
  - name: a
    sign_key: k
  - name: a
    sign_key: k
"#,
        );
        let errors = validate_config(&cfg).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigValidationError::DuplicateProjectName { project_name } if project_name == "a"
        )));
    }

    #[test]
    fn all_errors_are_collected() {
        let cfg = parse(
            r#"
projects:
  - name: a
    sign_key: ""
    publishers:
      - key: p1
        name: one
      - key: p1
        name: two
    applets:
      - name: app
        module: ""
        strategies:
          - event_type: WEIRD
            handler: ""
"#,
        );
        let errors = validate_config(&cfg).unwrap_err();
        assert_eq!(errors.len(), 5);
    }
}
