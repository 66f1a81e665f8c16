use k8s_openapi::{
    api::core::v1::{ExecAction, HTTPGetAction, Probe, TCPSocketAction},
    apimachinery::pkg::util::intstr::IntOrString,
};

pub enum ProbeAction {
    Exec(ExecAction),
    HttpGet(HTTPGetAction),
    TcpSocket(TCPSocketAction),
}

/// A builder to build [`Probe`] objects.
///
/// Unlike the Kubernetes defaults, only the timings that were set explicitly end up in the
/// resulting probe, which keeps rendered templates free of noise.
pub struct ProbeBuilder {
    action: ProbeAction,
    initial_delay_seconds: Option<i32>,
    period_seconds: Option<i32>,
    timeout_seconds: Option<i32>,
    failure_threshold: Option<i32>,
}

impl ProbeBuilder {
    pub fn new(action: ProbeAction) -> Self {
        Self {
            action,
            initial_delay_seconds: None,
            period_seconds: None,
            timeout_seconds: None,
            failure_threshold: None,
        }
    }

    /// This probe action executes the specified command
    pub fn exec(command: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(ProbeAction::Exec(ExecAction {
            command: Some(command.into_iter().map(Into::into).collect()),
        }))
    }

    /// This probe action does an HTTP GET request to `path` on the given port.
    pub fn http_get(port: IntOrString, path: impl Into<String>) -> Self {
        Self::new(ProbeAction::HttpGet(HTTPGetAction {
            path: Some(path.into()),
            port,
            scheme: Some("HTTP".to_owned()),
            ..Default::default()
        }))
    }

    pub fn tcp_socket(port: IntOrString) -> Self {
        Self::new(ProbeAction::TcpSocket(TCPSocketAction {
            port,
            ..Default::default()
        }))
    }

    pub fn initial_delay_seconds(mut self, seconds: i32) -> Self {
        self.initial_delay_seconds = Some(seconds);
        self
    }

    /// The period/interval in which the probe should be executed.
    pub fn period_seconds(mut self, seconds: i32) -> Self {
        self.period_seconds = Some(seconds);
        self
    }

    pub fn timeout_seconds(mut self, seconds: i32) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    pub fn failure_threshold(mut self, failure_threshold: i32) -> Self {
        self.failure_threshold = Some(failure_threshold);
        self
    }

    pub fn build(self) -> Probe {
        let mut probe = Probe {
            initial_delay_seconds: self.initial_delay_seconds,
            period_seconds: self.period_seconds,
            timeout_seconds: self.timeout_seconds,
            failure_threshold: self.failure_threshold,
            ..Probe::default()
        };

        match self.action {
            ProbeAction::Exec(exec_action) => probe.exec = Some(exec_action),
            ProbeAction::HttpGet(http_get_action) => probe.http_get = Some(http_get_action),
            ProbeAction::TcpSocket(tcp_socket_action) => probe.tcp_socket = Some(tcp_socket_action),
        }

        probe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_probe_only_sets_given_timings() {
        let probe = ProbeBuilder::tcp_socket(IntOrString::Int(8080))
            .initial_delay_seconds(30)
            .period_seconds(10)
            .build();

        assert_eq!(
            probe,
            Probe {
                tcp_socket: Some(TCPSocketAction {
                    port: IntOrString::Int(8080),
                    ..Default::default()
                }),
                initial_delay_seconds: Some(30),
                period_seconds: Some(10),
                ..Probe::default()
            }
        );
    }

    #[test]
    fn http_probe_on_named_port() {
        let probe = ProbeBuilder::http_get(IntOrString::String("http".to_owned()), "/status")
            .timeout_seconds(5)
            .build();

        let action = probe.http_get.expect("http action is set");
        assert_eq!(action.port, IntOrString::String("http".to_owned()));
        assert_eq!(action.path.as_deref(), Some("/status"));
        assert_eq!(probe.timeout_seconds, Some(5));
        assert_eq!(probe.period_seconds, None);
    }
}
