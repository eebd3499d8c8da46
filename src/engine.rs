//! Calls to the container engine CLI.
//!
//! [`Engine`] knows the engine program name and the format templates expected
//! by [`crate::parse`]. Everything goes through a [`CommandRunner`] so it can
//! be mocked.

use crate::command::{CommandRunner, ExecOutput, RunError};
use crate::parse::{is_label_set, parse_containers, parse_records, Container, Record};
use thiserror::Error;
use tracing::debug;

/// Format template for container listings.
pub const CONTAINER_FORMAT: &str = "{{.ID}}||{{.Names}}||{{.Image}}||{{.Ports}}";

/// Format template for service task listings.
pub const TASK_FORMAT: &str = "TASK={{.ID}}||NODE={{.Node}}||DESIRED={{.DesiredState}}||CURRENT={{.CurrentState}}||PORTS={{.Ports}}";

/// Label set by swarm on the containers of a service.
pub const SWARM_SERVICE_LABEL: &str = "com.docker.swarm.service.name";

/// Errors specific to [`Engine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not answer the version probe.
    #[error("{0}")]
    Unavailable(String),
    /// The engine ran but exited with a non-zero code.
    #[error("{}", failure_message(.program, .action, .stderr))]
    Failed {
        #[allow(missing_docs)]
        program: String,
        #[allow(missing_docs)]
        action: String,
        #[allow(missing_docs)]
        code: i32,
        #[allow(missing_docs)]
        stderr: String,
    },
    #[allow(missing_docs)]
    #[error(transparent)]
    Run(#[from] RunError),
}

fn failure_message(program: &str, action: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("{program} {action} failed")
    } else {
        stderr.to_owned()
    }
}

impl EngineError {
    /// Exit code a command should return for this error: the engine own
    /// code when it is meaningful, else 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::Failed { code, .. } if *code > 0 => *code,
            _ => 1,
        }
    }
}

/// Containers split by the presence of the swarm service label.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Classified {
    /// containers belonging to a swarm service
    pub swarm: Vec<Container>,
    /// containers started on their own
    pub standalone: Vec<Container>,
}

/// Handle on the container engine CLI.
pub struct Engine<'a> {
    program: String,
    swarm_label: String,
    runner: &'a dyn CommandRunner,
}

impl<'a> Engine<'a> {
    /// Create an engine calling `program` through `runner`.
    pub fn new(program: &str, swarm_label: &str, runner: &'a dyn CommandRunner) -> Self {
        Engine {
            program: program.to_owned(),
            swarm_label: swarm_label.to_owned(),
            runner,
        }
    }

    fn call(&self, args: &[&str]) -> Result<ExecOutput, RunError> {
        self.runner
            .run(&self.program, args.iter().map(|s| s.to_string()).collect())
    }

    /// Run `args` and return stdout, turning a non-zero exit into [`EngineError::Failed`].
    fn checked(&self, action: &str, args: &[&str]) -> Result<String, EngineError> {
        let output = self.call(args)?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(EngineError::Failed {
                program: self.program.clone(),
                action: action.to_owned(),
                code: output.code,
                stderr: output.stderr,
            })
        }
    }

    /// Check that the engine CLI answers a version probe.
    pub fn check_available(&self) -> Result<(), EngineError> {
        let fallback = || {
            format!(
                "Error: {} CLI not available. Install it or add it to PATH.",
                self.program
            )
        };
        match self.call(&["version", "--format", "{{.Client.Version}}"]) {
            Ok(output) if output.success() => {
                debug!("{} client version {}", self.program, output.stdout.trim());
                Ok(())
            }
            Ok(output) => {
                let stderr = output.stderr.trim();
                Err(EngineError::Unavailable(if stderr.is_empty() {
                    fallback()
                } else {
                    stderr.to_owned()
                }))
            }
            Err(e) => {
                debug!("{}", e);
                Err(EngineError::Unavailable(fallback()))
            }
        }
    }

    /// Running containers, optionally restricted with a `ps --filter`.
    pub fn containers(&self, filter: Option<&str>) -> Result<Vec<Container>, EngineError> {
        let mut args = vec!["ps"];
        if let Some(filter) = filter {
            args.extend(["--filter", filter]);
        }
        args.extend(["--format", CONTAINER_FORMAT]);
        Ok(parse_containers(&self.checked("ps", &args)?))
    }

    /// Tasks of the swarm `service`.
    pub fn service_tasks(&self, service: &str) -> Result<Vec<Record>, EngineError> {
        let stdout = self.checked(
            &format!("service ps {service}"),
            &["service", "ps", service, "--no-trunc", "--format", TASK_FORMAT],
        )?;
        Ok(parse_records(&stdout))
    }

    /// Running containers of the swarm `service`.
    pub fn service_containers(&self, service: &str) -> Result<Vec<Container>, EngineError> {
        self.containers(Some(&format!("label={}={}", self.swarm_label, service)))
    }

    /// Value of the `label` of container `id`, as printed by the engine.
    ///
    /// A failed lookup yields an empty value, which reads as "label not set".
    pub fn inspect_label(&self, id: &str, label: &str) -> Result<String, EngineError> {
        let template = format!("{{{{ index .Config.Labels \"{label}\" }}}}");
        let output = self.call(&["inspect", "-f", &template, id])?;
        Ok(output.stdout.trim().to_owned())
    }

    /// Split `containers` according to the swarm service label.
    ///
    /// One `inspect` per container, in listing order.
    pub fn classify(&self, containers: Vec<Container>) -> Result<Classified, EngineError> {
        let mut res = Classified::default();
        for container in containers {
            let value = self.inspect_label(&container.id, &self.swarm_label)?;
            debug!("{} {}={:?}", container.id, self.swarm_label, value);
            if is_label_set(&value) {
                res.swarm.push(container);
            } else {
                res.standalone.push(container);
            }
        }
        Ok(res)
    }

    /// List running containers and classify them.
    pub fn classified_containers(&self) -> Result<Classified, EngineError> {
        let containers = self.containers(None)?;
        self.classify(containers)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::command::MockCommandRunner;

    /// Mock answering `inspect` with `labels[id]` and `ps` with `ps_output`.
    pub(crate) fn docker_mock(
        ps_output: &'static str,
        labels: &'static [(&'static str, &'static str)],
    ) -> MockCommandRunner {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .withf(|cmd, args| cmd == "docker" && args[0] == "ps")
            .returning(move |_, _| Ok(ExecOutput::ok(ps_output)));
        mock.expect_run()
            .withf(|cmd, args| cmd == "docker" && args[0] == "inspect")
            .returning(move |_, args| {
                let id = args.last().cloned().unwrap_or_default();
                let value = labels
                    .iter()
                    .find(|(i, _)| *i == id)
                    .map(|(_, v)| *v)
                    .unwrap_or("<no value>");
                Ok(ExecOutput::ok(format!("{value}\n")))
            });
        mock
    }

    const TWO_WEBS: &str =
        "abc123||web-1||nginx:latest||80/tcp\ndef456||web-2||nginx:latest||80/tcp";

    #[test]
    fn classify_labelled_containers_as_swarm() {
        let mock = docker_mock(TWO_WEBS, &[("abc123", "web"), ("def456", "web")]);
        let engine = Engine::new("docker", SWARM_SERVICE_LABEL, &mock);
        let res = engine.classified_containers().unwrap();
        assert_eq!(res.swarm.len(), 2);
        assert_eq!(res.swarm[0].name, "web-1");
        assert_eq!(res.swarm[1].name, "web-2");
        assert!(res.standalone.is_empty());
    }

    #[test]
    fn classify_unlabelled_containers_as_standalone() {
        let mock = docker_mock(TWO_WEBS, &[("abc123", "web"), ("def456", "")]);
        let engine = Engine::new("docker", SWARM_SERVICE_LABEL, &mock);
        let res = engine.classified_containers().unwrap();
        assert_eq!(res.swarm.len(), 1);
        assert_eq!(res.standalone.len(), 1);
        assert_eq!(res.standalone[0].id, "def456");
    }

    #[test]
    fn inspect_one_label_per_container() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .withf(|cmd, args| {
                cmd == "docker"
                    && args[..]
                        == [
                            "inspect",
                            "-f",
                            "{{ index .Config.Labels \"com.docker.swarm.service.name\" }}",
                            "abc123",
                        ]
            })
            .times(1)
            .returning(|_, _| Ok(ExecOutput::ok("web\n")));
        let engine = Engine::new("docker", SWARM_SERVICE_LABEL, &mock);
        let res = engine
            .classify(vec![Container::from_line("abc123||web-1")])
            .unwrap();
        assert_eq!(res.swarm.len(), 1);
    }

    #[test]
    fn report_failed_listing_with_engine_stderr_and_code() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .returning(|_, _| Ok(ExecOutput::failed(125, "Cannot connect to the Docker daemon\n")));
        let engine = Engine::new("docker", SWARM_SERVICE_LABEL, &mock);
        let err = engine.containers(None).unwrap_err();
        assert_eq!(err.to_string(), "Cannot connect to the Docker daemon");
        assert_eq!(err.exit_code(), 125);
    }

    #[test]
    fn name_the_action_when_stderr_is_empty() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .returning(|_, _| Ok(ExecOutput::failed(-1, "")));
        let engine = Engine::new("docker", SWARM_SERVICE_LABEL, &mock);
        let err = engine.service_tasks("api").unwrap_err();
        assert_eq!(err.to_string(), "docker service ps api failed");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn filter_service_containers_by_label() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .withf(|_, args| {
                args[..3] == ["ps", "--filter", "label=com.docker.swarm.service.name=api"]
            })
            .times(1)
            .returning(|_, _| Ok(ExecOutput::ok("abc||api.1.x||api:1||\n")));
        let engine = Engine::new("docker", SWARM_SERVICE_LABEL, &mock);
        let res = engine.service_containers("api").unwrap();
        assert_eq!(res[0].name, "api.1.x");
    }

    #[test]
    fn report_unavailable_engine_with_stderr() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .returning(|_, _| Ok(ExecOutput::failed(1, "permission denied\n")));
        let engine = Engine::new("docker", SWARM_SERVICE_LABEL, &mock);
        let err = engine.check_available().unwrap_err();
        assert_eq!(err.to_string(), "permission denied");
    }

    #[test]
    fn report_missing_engine_with_fallback_message() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run().returning(|cmd, _| {
            Err(RunError::SpawnFailed {
                program: cmd.to_owned(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        });
        let engine = Engine::new("podman", SWARM_SERVICE_LABEL, &mock);
        let err = engine.check_available().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: podman CLI not available. Install it or add it to PATH."
        );
    }
}
