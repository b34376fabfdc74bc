//! Application shell.
use crate::{Error, Root, SubmitFn, View, ViewRef};
use serde::Deserialize;
use tracing::{info, warn};

/// The event loop of the host toolkit.
pub trait Host {
    /// Runs the event loop until the application quits, and returns the exit code.
    fn exec(&mut self) -> anyhow::Result<i32>;
}

/// Application settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of undo steps kept by each root. 0 disables the history.
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config { history_limit: 100 }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Config, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

/// An application running view trees in a host event loop.
///
/// The host is created once by the caller and handed over here.
pub struct Application<H> {
    host: H,
    config: Config,
}

impl<H: Host> Application<H> {
    pub fn new(host: H, config: Config) -> Application<H> {
        Application { host, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Creates a root view tree holding `initial`.
    pub fn mount<V: View>(
        &self,
        initial: V::Data,
        build: impl FnOnce(SubmitFn<V::Data>) -> ViewRef<V>,
    ) -> Root<V> {
        Root::new(initial, self.config.history_limit, build)
    }

    /// Runs the host event loop. A non-zero exit code is returned as [`Error::ExitCode`].
    pub fn run(&mut self) -> Result<i32, Error> {
        info!("Application: entering event loop");
        let code = self.host.exec()?;
        if code != 0 {
            warn!("Application: event loop exited with code {code}");
            return Err(Error::ExitCode(code));
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::LineEditView;

    struct FakeHost(anyhow::Result<i32>);

    impl Host for FakeHost {
        fn exec(&mut self) -> anyhow::Result<i32> {
            match &self.0 {
                Ok(code) => Ok(*code),
                Err(err) => Err(anyhow::anyhow!("{err}")),
            }
        }
    }

    #[test]
    fn config_from_json() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
        assert_eq!(Config::from_json(r#"{"history_limit": 5}"#).unwrap().history_limit, 5);
        assert!(matches!(
            Config::from_json(r#"{"history_limit": "many"}"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn run_reports_exit_codes() {
        assert_eq!(Application::new(FakeHost(Ok(0)), Config::default()).run().unwrap(), 0);
        assert!(matches!(
            Application::new(FakeHost(Ok(3)), Config::default()).run(),
            Err(Error::ExitCode(3))
        ));
        let err = Application::new(FakeHost(Err(anyhow::anyhow!("display lost"))), Config::default())
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::Host(_)));
        assert_eq!(err.to_string(), "display lost");
    }

    #[test]
    fn mounted_roots_use_the_configured_history() {
        let app = Application::new(FakeHost(Ok(0)), Config { history_limit: 0 });
        let mut root = app.mount("a".to_string(), LineEditView::new);
        root.set_data("b".to_string(), true);
        assert!(!root.can_undo());
        assert_eq!(root.view().borrow().widget().text(), "b");
    }
}
