//! One parameterised driver for every demo scenario.
//!
//! Each scenario provisions its own slots (purposes carry a per-scenario
//! tag), wires an authority to a door and then walks a fixed sequence of
//! operations. Every step states the outcome it expects; a step that is
//! applied when a rejection was expected, or rejected with a different code,
//! aborts the run with [`ClientError::Unexpected`].

use crate::call::{Call, SlotId};
use crate::error::{ClientError, Result};
use crate::ledger::{DoorView, Ledger, RequestView};
use crate::session::Session;
use gated_door::{DoorAction, DoorError};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Scenario {
    /// Single owner cycles the door directly
    Door,
    /// Direct transitions by a privileged owner, refused for anyone else
    PrivilegedOwner,
    /// Lock and unlock go through quorum-approved requests
    MultisigDoor,
    /// Full request lifecycle including late and outside approvals
    GeneralMultisig,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Door,
        Scenario::PrivilegedOwner,
        Scenario::MultisigDoor,
        Scenario::GeneralMultisig,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Door => "door",
            Scenario::PrivilegedOwner => "privileged-owner",
            Scenario::MultisigDoor => "multisig-door",
            Scenario::GeneralMultisig => "general-multisig",
        }
    }

    /// Prefix for the scenario's slot purposes.
    fn tag(&self) -> &'static str {
        match self {
            Scenario::Door => "dr",
            Scenario::PrivilegedOwner => "po",
            Scenario::MultisigDoor => "md",
            Scenario::GeneralMultisig => "gm",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Rejected(DoorError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub signer: String,
    pub operation: &'static str,
    pub outcome: Outcome,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Applied => write!(f, "{:<20} {:<10} applied", self.operation, self.signer),
            Outcome::Rejected(code) => write!(
                f,
                "{:<20} {:<10} rejected ({:?})",
                self.operation, self.signer, code
            ),
        }
    }
}

/// What a scenario did and where it left the door.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub scenario: Scenario,
    pub steps: Vec<Step>,
    pub door: DoorView,
    /// The last request the scenario worked on, if any
    pub request: Option<RequestView>,
}

impl Report {
    pub fn applied(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.outcome == Outcome::Applied)
            .count()
    }

    pub fn rejections(&self) -> Vec<DoorError> {
        self.steps
            .iter()
            .filter_map(|step| match step.outcome {
                Outcome::Rejected(code) => Some(code),
                Outcome::Applied => None,
            })
            .collect()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "scenario {}", self.scenario)?;
        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }
        write!(
            f,
            "door: {:?} / {:?}",
            self.door.lock, self.door.position
        )?;
        if let Some(request) = &self.request {
            write!(
                f,
                "\nrequest: {:?} by {}, approved by [{}], executed: {}",
                request.action,
                request.proposer,
                request.approvers.join(", "),
                request.executed
            )?;
        }
        Ok(())
    }
}

/// Slots of a door wired to its authority.
struct Gate {
    authority: SlotId,
    door: SlotId,
}

pub struct Driver<'a, L> {
    session: &'a Session<L>,
    steps: Vec<Step>,
}

impl<'a, L: Ledger> Driver<'a, L> {
    pub fn new(session: &'a Session<L>) -> Self {
        Self {
            session,
            steps: Vec::new(),
        }
    }

    /// Runs `scenario` from a clean step log.
    pub async fn run(&mut self, scenario: Scenario) -> Result<Report> {
        self.steps.clear();
        info!("Running scenario {}", scenario);

        let report = match scenario {
            Scenario::Door => self.door(scenario).await?,
            Scenario::PrivilegedOwner => self.privileged_owner(scenario).await?,
            Scenario::MultisigDoor => self.multisig_door(scenario).await?,
            Scenario::GeneralMultisig => self.general_multisig(scenario).await?,
        };

        info!(
            "Scenario {} finished: {} applied, {} rejected as expected",
            scenario,
            report.applied(),
            report.rejections().len()
        );
        Ok(report)
    }

    async fn door(&mut self, scenario: Scenario) -> Result<Report> {
        let keeper = "keeper".to_string();
        self.session.identity(&keeper).await?;
        let gate = self.gate(scenario, &[keeper.clone()], 1).await?;

        for action in [
            DoorAction::Unlock,
            DoorAction::Open,
            DoorAction::Close,
            DoorAction::Lock,
        ] {
            self.expect_ok(&keeper, Call::transition(action, gate.door))
                .await?;
        }

        self.finish(scenario, &gate, None).await
    }

    async fn privileged_owner(&mut self, scenario: Scenario) -> Result<Report> {
        let owner = "owner".to_string();
        let intruder = "intruder".to_string();
        self.session.identity(&owner).await?;
        self.session.identity(&intruder).await?;
        let gate = self.gate(scenario, &[owner.clone()], 1).await?;

        self.expect_rejected(&intruder, Call::unlock(gate.door), DoorError::NotAuthorized)
            .await?;
        self.expect_rejected(&owner, Call::open(gate.door), DoorError::Locked)
            .await?;

        for action in [
            DoorAction::Unlock,
            DoorAction::Open,
            DoorAction::Close,
            DoorAction::Lock,
        ] {
            self.expect_ok(&owner, Call::transition(action, gate.door))
                .await?;
        }

        self.finish(scenario, &gate, None).await
    }

    async fn multisig_door(&mut self, scenario: Scenario) -> Result<Report> {
        let threshold = self.session.config().default_threshold as usize;
        let owners = self.owners(threshold + 1).await?;
        let gate = self.gate(scenario, &owners, threshold).await?;
        let proposer = &owners[0];

        let unlock = self
            .propose(scenario, proposer, &gate, DoorAction::Unlock)
            .await?;
        for owner in &owners[..threshold - 1] {
            self.expect_ok(owner, Call::approve(unlock)).await?;
        }
        self.expect_rejected(proposer, Call::execute(unlock), DoorError::QuorumNotMet)
            .await?;
        self.expect_ok(&owners[threshold - 1], Call::approve(unlock))
            .await?;
        self.expect_ok(proposer, Call::execute(unlock)).await?;

        self.expect_ok(proposer, Call::open(gate.door)).await?;
        self.expect_ok(proposer, Call::close(gate.door)).await?;

        // a different subset of owners seals the door again
        let lock = self
            .propose(scenario, proposer, &gate, DoorAction::Lock)
            .await?;
        for owner in &owners[1..] {
            self.expect_ok(owner, Call::approve(lock)).await?;
        }
        self.expect_ok(proposer, Call::execute(lock)).await?;

        let request = self.session.ledger().request(&lock).await?;
        self.finish(scenario, &gate, Some(request)).await
    }

    async fn general_multisig(&mut self, scenario: Scenario) -> Result<Report> {
        let threshold = self.session.config().default_threshold as usize;
        let owners = self.owners(threshold + 1).await?;
        let outsider = "outsider".to_string();
        self.session.identity(&outsider).await?;
        let gate = self.gate(scenario, &owners, threshold).await?;

        let unlock = Call::unlock(gate.door).cosigned(&owners[1..threshold]);
        self.expect_ok(&owners[0], unlock).await?;

        let proposer = &owners[owners.len() - 1];
        let request = self
            .propose(scenario, proposer, &gate, DoorAction::Open)
            .await?;
        for owner in &owners[..threshold - 1] {
            self.expect_ok(owner, Call::approve(request)).await?;
        }
        self.expect_readiness(&request, false).await?;
        self.expect_ok(&owners[threshold - 1], Call::approve(request))
            .await?;
        self.expect_readiness(&request, true).await?;

        self.expect_ok(&owners[0], Call::execute(request)).await?;

        let late = &owners[threshold];
        self.expect_rejected(late, Call::approve(request), DoorError::AlreadyExecuted)
            .await?;
        self.expect_rejected(&outsider, Call::approve(request), DoorError::NotAnOwner)
            .await?;
        self.expect_rejected(&owners[0], Call::execute(request), DoorError::AlreadyExecuted)
            .await?;

        let view = self.session.ledger().request(&request).await?;
        self.finish(scenario, &gate, Some(view)).await
    }

    /// Registers `count` owners named `owner_<i>`.
    async fn owners(&self, count: usize) -> Result<Vec<String>> {
        let mut owners = Vec::with_capacity(count);
        for index in 0..count {
            let name = format!("owner_{}", index);
            self.session.identity(&name).await?;
            owners.push(name);
        }
        Ok(owners)
    }

    /// Provisions an authority and a door for `owners[0]`, configures the
    /// authority and binds the door to it.
    async fn gate(&mut self, scenario: Scenario, owners: &[String], threshold: usize) -> Result<Gate> {
        let creator = owners
            .first()
            .ok_or_else(|| ClientError::Config("a gate needs at least one owner".to_string()))?;
        let threshold = u8::try_from(threshold)
            .map_err(|_| ClientError::Config(format!("threshold {} out of range", threshold)))?;

        let authority = self
            .session
            .provision(creator, &format!("{}_authority", scenario.tag()))
            .await?;
        let door = self
            .session
            .provision(creator, &format!("{}_door", scenario.tag()))
            .await?;

        self.expect_ok(creator, Call::configure_authority(authority, owners, threshold))
            .await?;
        self.expect_ok(creator, Call::initialize_door(door, authority))
            .await?;

        Ok(Gate { authority, door })
    }

    /// Provisions a request slot for `proposer` and files a request for
    /// `action` against the gate.
    async fn propose(
        &mut self,
        scenario: Scenario,
        proposer: &str,
        gate: &Gate,
        action: DoorAction,
    ) -> Result<SlotId> {
        let purpose = format!("{}_req_{:?}", scenario.tag(), action).to_lowercase();
        let request = self.session.provision(proposer, &purpose).await?;
        self.expect_ok(
            proposer,
            Call::create_request(request, gate.authority, gate.door, action),
        )
        .await?;
        Ok(request)
    }

    async fn expect_ok(&mut self, signer: &str, call: Call) -> Result<()> {
        self.session.send(signer, &call).await?;
        info!("{} by {}: applied", call.name(), signer);
        self.steps.push(Step {
            signer: signer.to_string(),
            operation: call.name(),
            outcome: Outcome::Applied,
        });
        Ok(())
    }

    async fn expect_rejected(&mut self, signer: &str, call: Call, expected: DoorError) -> Result<()> {
        match self.session.send(signer, &call).await {
            Ok(()) => Err(ClientError::Unexpected(format!(
                "{} by {} was applied, expected {:?}",
                call.name(),
                signer,
                expected
            ))),
            Err(err) => match err.rejection() {
                Some(code) if code == expected => {
                    info!("{} by {}: rejected with {:?}", call.name(), signer, code);
                    self.steps.push(Step {
                        signer: signer.to_string(),
                        operation: call.name(),
                        outcome: Outcome::Rejected(code),
                    });
                    Ok(())
                }
                Some(code) => Err(ClientError::Unexpected(format!(
                    "{} by {} was rejected with {:?}, expected {:?}",
                    call.name(),
                    signer,
                    code,
                    expected
                ))),
                None => Err(err),
            },
        }
    }

    async fn expect_readiness(&self, request: &SlotId, ready: bool) -> Result<()> {
        let view = self.session.ledger().request(request).await?;
        if view.can_execute != ready {
            warn!(
                "request approved by [{}] reports can_execute = {}",
                view.approvers.join(", "),
                view.can_execute
            );
            return Err(ClientError::Unexpected(format!(
                "can_execute is {}, expected {}",
                view.can_execute, ready
            )));
        }
        Ok(())
    }

    async fn finish(
        &mut self,
        scenario: Scenario,
        gate: &Gate,
        request: Option<RequestView>,
    ) -> Result<Report> {
        let door = self.session.ledger().door(&gate.door).await?;
        Ok(Report {
            scenario,
            steps: std::mem::take(&mut self.steps),
            door,
            request,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_scenario_names_are_distinct() {
        let names: Vec<_> = Scenario::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["door", "privileged-owner", "multisig-door", "general-multisig"]
        );

        let tags: BTreeSet<_> = Scenario::ALL.iter().map(|s| s.tag()).collect();
        assert_eq!(tags.len(), Scenario::ALL.len());
    }

    #[test]
    fn test_scenario_parses_from_cli_name() {
        use clap::ValueEnum;
        for scenario in Scenario::ALL {
            assert_eq!(Scenario::from_str(scenario.name(), false), Ok(scenario));
        }
    }

    #[test]
    fn test_door_scenario_report() {
        use crate::{ClientConfig, SandboxLedger};
        use std::sync::Arc;

        let report = tokio_test::block_on(async {
            let config = Arc::new(ClientConfig::sandbox());
            let session = Session::open(config, SandboxLedger::new(), "payer")
                .await
                .unwrap();
            Driver::new(&session).run(Scenario::Door).await.unwrap()
        });

        assert_eq!(report.applied(), 6);
        assert!(report.rejections().is_empty());
        assert!(report.to_string().contains("Locked / Closed"));
    }

    #[test]
    fn test_step_display() {
        let step = Step {
            signer: "owner_1".to_string(),
            operation: "approve",
            outcome: Outcome::Rejected(DoorError::AlreadyExecuted),
        };
        let line = step.to_string();
        assert!(line.contains("approve"));
        assert!(line.contains("owner_1"));
        assert!(line.contains("AlreadyExecuted"));
    }
}
