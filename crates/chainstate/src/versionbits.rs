//! BIP9 deployment states, evaluated once per confirmation window.

use kepler_consensus::deployments::{
    version_signals, Deployment, DeploymentPos, ALL_DEPLOYMENTS, VERSIONBITS_TOP_BITS,
};
use kepler_consensus::ConsensusParams;
use kepler_pow::chain::ChainIndexView;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ThresholdState {
    Defined,
    Started,
    LockedIn,
    Active,
    Failed,
}

impl ThresholdState {
    pub fn as_str(self) -> &'static str {
        match self {
            ThresholdState::Defined => "defined",
            ThresholdState::Started => "started",
            ThresholdState::LockedIn => "locked_in",
            ThresholdState::Active => "active",
            ThresholdState::Failed => "failed",
        }
    }
}

/// State of deployment `pos` for the block built on top of `prev`.
///
/// All blocks of one window share a state; it is derived from the last block of the
/// previous window. Windows are replayed forward from the newest one that is still
/// `Defined` by start time, or from the chain start.
pub fn deployment_state<V: ChainIndexView + ?Sized>(
    view: &V,
    prev: Option<V::Id>,
    params: &ConsensusParams,
    pos: DeploymentPos,
) -> ThresholdState {
    let deployment = params.deployment(pos);
    let period = params.miner_confirmation_window.max(1) as i32;
    let threshold = params.rule_change_activation_threshold as usize;

    let mut cursor = prev.and_then(|id| {
        let height = view.height(id);
        view.ancestor(id, height - ((height + 1) % period))
    });

    let mut pending = Vec::new();
    while let Some(id) = cursor {
        if view.median_time_past(id) < deployment.start_time {
            break;
        }
        pending.push(id);
        cursor = view.ancestor(id, view.height(id) - period);
    }

    let mut state = ThresholdState::Defined;
    while let Some(id) = pending.pop() {
        let mtp = view.median_time_past(id);
        state = match state {
            ThresholdState::Defined => {
                if mtp >= deployment.timeout {
                    ThresholdState::Failed
                } else if mtp >= deployment.start_time {
                    ThresholdState::Started
                } else {
                    ThresholdState::Defined
                }
            }
            ThresholdState::Started => {
                if mtp >= deployment.timeout {
                    ThresholdState::Failed
                } else if count_signals(view, id, period, deployment) >= threshold {
                    ThresholdState::LockedIn
                } else {
                    ThresholdState::Started
                }
            }
            ThresholdState::LockedIn => ThresholdState::Active,
            ThresholdState::Active => ThresholdState::Active,
            ThresholdState::Failed => ThresholdState::Failed,
        };
    }
    state
}

fn count_signals<V: ChainIndexView + ?Sized>(
    view: &V,
    last: V::Id,
    period: i32,
    deployment: &Deployment,
) -> usize {
    let mut count = 0;
    let mut cursor = Some(last);
    for _ in 0..period {
        let Some(id) = cursor else {
            break;
        };
        if version_signals(view.version(id), deployment) {
            count += 1;
        }
        cursor = view.prev(id);
    }
    count
}

/// Version-bits portion of a new block's version: the top bits plus every deployment
/// that is started or locked in.
pub fn compute_block_version<V: ChainIndexView + ?Sized>(
    view: &V,
    prev: Option<V::Id>,
    params: &ConsensusParams,
) -> i32 {
    let mut version = VERSIONBITS_TOP_BITS as u32;
    for pos in ALL_DEPLOYMENTS {
        let state = deployment_state(view, prev, params, pos);
        if matches!(state, ThresholdState::Started | ThresholdState::LockedIn) {
            version |= params.deployment(pos).mask();
        }
    }
    version as i32
}
