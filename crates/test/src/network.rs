use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tracing::debug;

use chronobft_engine::network::{NetworkMsg, NetworkRef};

use crate::journal::{Entry, Journal};
use crate::TestContext;

/// A network which delivers nothing, and records what the node published.
pub struct TestNetwork {
    journal: Journal,
}

impl TestNetwork {
    pub async fn spawn(journal: Journal) -> Result<NetworkRef<TestContext>, ractor::SpawnErr> {
        let (actor_ref, _) = Actor::spawn(None, Self { journal }, ()).await?;
        Ok(actor_ref)
    }
}

#[async_trait]
impl Actor for TestNetwork {
    type Msg = NetworkMsg<TestContext>;
    type State = ();
    type Arguments = ();

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        _args: (),
    ) -> Result<(), ActorProcessingErr> {
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        msg: Self::Msg,
        _state: &mut (),
    ) -> Result<(), ActorProcessingErr> {
        match msg {
            NetworkMsg::Publish(msg) => {
                debug!(height = %msg.height(), "Publishing {msg:?}");
                self.journal.record(Entry::Published(msg));
            }
        }

        Ok(())
    }
}
