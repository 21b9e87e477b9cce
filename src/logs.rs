use crate::{
    types::{CommandLog, JoinLog, KillLog, ModCall, RadioCall},
    ErlcClient, Result,
};

/// Log endpoints of an [`ErlcClient`], returned by [`ErlcClient::logs`].
#[derive(Clone, Copy, Debug)]
pub struct Logs<'a> {
    client: &'a ErlcClient,
}

impl<'a> Logs<'a> {
    pub(crate) fn new(client: &'a ErlcClient) -> Self {
        Self { client }
    }

    /// See [`ErlcClient::kill_logs`].
    pub async fn kills(&self) -> Result<Vec<KillLog>> {
        self.client.kill_logs().await
    }

    /// See [`ErlcClient::command_logs`].
    pub async fn commands(&self) -> Result<Vec<CommandLog>> {
        self.client.command_logs().await
    }

    /// See [`ErlcClient::join_logs`].
    pub async fn joins(&self) -> Result<Vec<JoinLog>> {
        self.client.join_logs().await
    }

    /// See [`ErlcClient::mod_calls`].
    pub async fn mod_calls(&self) -> Result<Vec<ModCall>> {
        self.client.mod_calls().await
    }

    /// See [`ErlcClient::radio_calls`].
    pub async fn radio_calls(&self) -> Result<Vec<RadioCall>> {
        self.client.radio_calls().await
    }
}
