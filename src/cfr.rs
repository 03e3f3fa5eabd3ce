//! Counterfactual Regret Minimization over the full game tree.
//!
//! Each info state tracks cumulative regret and cumulative strategy
//! weight per legal action. One iteration deals a random hand and
//! recursively walks every betting line, propagating one reach
//! probability per player (the product of that player's own action
//! probabilities on the path). The time-averaged strategy, not the
//! final regret-matched one, is the artifact that converges to
//! equilibrium.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{OclError, OclResult};
use crate::hand::{Action, GameConfig, HandState};
use crate::info_state::InfoState;
use crate::policy::{ActionDistribution, Policy};

/// One info state's accumulated data. `actions`, `regret_sum`, and
/// `strategy_sum` are parallel, in legal-action order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoStateData {
    pub actions: Vec<Action>,
    pub regret_sum: Vec<f64>,
    pub strategy_sum: Vec<f64>,
}

impl InfoStateData {
    pub fn new(actions: Vec<Action>) -> Self {
        let n = actions.len();
        InfoStateData {
            actions,
            regret_sum: vec![0.0; n],
            strategy_sum: vec![0.0; n],
        }
    }

    /// Current strategy via regret matching: proportional to positive
    /// accumulated regret, uniform when no regret is positive.
    pub fn current_strategy(&self) -> Vec<f64> {
        let positive_sum: f64 = self.regret_sum.iter().map(|&r| r.max(0.0)).sum();
        if positive_sum > 0.0 {
            self.regret_sum
                .iter()
                .map(|&r| r.max(0.0) / positive_sum)
                .collect()
        } else {
            vec![1.0 / self.actions.len() as f64; self.actions.len()]
        }
    }

    /// Average strategy over all iterations so far, uniform if this
    /// info state was never weighted.
    pub fn average_strategy(&self) -> Vec<f64> {
        let total: f64 = self.strategy_sum.iter().sum();
        if total > 0.0 {
            self.strategy_sum.iter().map(|&s| s / total).collect()
        } else {
            vec![1.0 / self.actions.len() as f64; self.actions.len()]
        }
    }
}

/// The CFR trainer. Owns the regret and strategy-sum tables for its
/// lifetime; nothing else mutates them.
#[derive(Debug, Clone)]
pub struct CfrSolver {
    config: GameConfig,
    nodes: HashMap<InfoState, InfoStateData>,
    iterations: u64,
}

impl CfrSolver {
    pub fn new(config: GameConfig) -> Self {
        CfrSolver {
            config,
            nodes: HashMap::new(),
            iterations: 0,
        }
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Read-only view of the accumulated tables.
    pub fn nodes(&self) -> &HashMap<InfoState, InfoStateData> {
        &self.nodes
    }

    /// Run `iterations` self-play iterations and return the averaged
    /// policy. Any state-machine error aborts the run: it means the
    /// machine itself is broken, and partial updates would corrupt
    /// convergence.
    pub fn train(&mut self, iterations: u64, rng: &mut impl Rng) -> OclResult<Policy> {
        for _ in 0..iterations {
            self.run_iteration(rng)?;
        }
        Ok(self.average_policy())
    }

    /// Parallel training: iterations are split into batches, each batch
    /// sharded across rayon workers running on a cloned snapshot of the
    /// tables, and the owner merges every worker's deltas before the
    /// next batch starts. A failed worker aborts the whole run with no
    /// partial merge.
    pub fn train_parallel(
        &mut self,
        iterations: u64,
        batch_size: u64,
        seed: u64,
    ) -> OclResult<Policy> {
        let batch_size = batch_size.max(1);
        let mut remaining = iterations;
        let mut batch_index = 0u64;

        while remaining > 0 {
            let batch = remaining.min(batch_size);
            let workers = (rayon::current_num_threads() as u64).clamp(1, batch);

            let mut shares = Vec::with_capacity(workers as usize);
            for w in 0..workers {
                let n = batch / workers + u64::from(w < batch % workers);
                if n > 0 {
                    let worker_seed = seed ^ ((batch_index << 20) | w).wrapping_mul(0x9E37_79B9);
                    shares.push((n, worker_seed));
                }
            }

            let snapshot = self.nodes.clone();
            let tables: OclResult<Vec<HashMap<InfoState, InfoStateData>>> = shares
                .into_par_iter()
                .map(|(n, worker_seed)| {
                    let mut worker = self.clone();
                    let mut rng = StdRng::seed_from_u64(worker_seed);
                    for _ in 0..n {
                        worker.run_iteration(&mut rng)?;
                    }
                    Ok(worker.nodes)
                })
                .collect();

            for table in tables? {
                self.merge_deltas(table, &snapshot);
            }
            self.iterations += batch;
            remaining -= batch;
            batch_index += 1;
        }
        Ok(self.average_policy())
    }

    /// Fold one worker's post-batch table back into the owner's by
    /// adding what the worker accumulated beyond the shared snapshot.
    fn merge_deltas(
        &mut self,
        table: HashMap<InfoState, InfoStateData>,
        snapshot: &HashMap<InfoState, InfoStateData>,
    ) {
        for (info, data) in table {
            let base = snapshot.get(&info);
            let entry = self
                .nodes
                .entry(info)
                .or_insert_with(|| InfoStateData::new(data.actions.clone()));
            for i in 0..data.actions.len() {
                let (base_regret, base_weight) =
                    base.map_or((0.0, 0.0), |b| (b.regret_sum[i], b.strategy_sum[i]));
                entry.regret_sum[i] += data.regret_sum[i] - base_regret;
                entry.strategy_sum[i] += data.strategy_sum[i] - base_weight;
            }
        }
    }

    /// One self-play iteration: deal a fresh random hand, walk the
    /// whole tree from it.
    fn run_iteration(&mut self, rng: &mut impl Rng) -> OclResult<()> {
        let mut state = HandState::new(self.config);
        state.deal(rng)?;
        self.cfr(&state, 1.0, 1.0)?;
        self.iterations += 1;
        Ok(())
    }

    /// Recursive CFR step. `op_reach`/`ip_reach` are each player's own
    /// contribution to the probability of reaching `state`. Returns the
    /// expected value for both players under the current strategies.
    fn cfr(&mut self, state: &HandState, op_reach: f64, ip_reach: f64) -> OclResult<[f64; 2]> {
        if state.is_over {
            let stacks = state.stacks();
            return Ok([stacks[0] as f64, stacks[1] as f64]);
        }

        let player = state.acting_pos;
        let info = InfoState::observe_acting(state).ok_or(OclError::CardsNotDealt)?;
        let actions = state.valid_actions();

        let strategy = self
            .nodes
            .entry(info.clone())
            .or_insert_with(|| InfoStateData::new(actions.clone()))
            .current_strategy();

        let mut action_values = vec![0.0f64; actions.len()];
        let mut node_value = [0.0f64; 2];

        for (i, &action) in actions.iter().enumerate() {
            let mut next = state.clone();
            next.apply(action)?;

            let child_values = if player == 0 {
                self.cfr(&next, op_reach * strategy[i], ip_reach)?
            } else {
                self.cfr(&next, op_reach, ip_reach * strategy[i])?
            };

            action_values[i] = child_values[player];
            node_value[0] += strategy[i] * child_values[0];
            node_value[1] += strategy[i] * child_values[1];
        }

        // Counterfactual regret is weighted by the opponent's reach;
        // the current strategy is accumulated for averaging.
        let opp_reach = if player == 0 { ip_reach } else { op_reach };
        if let Some(data) = self.nodes.get_mut(&info) {
            for i in 0..actions.len() {
                data.regret_sum[i] += opp_reach * (action_values[i] - node_value[player]);
                data.strategy_sum[i] += strategy[i];
            }
        }

        Ok(node_value)
    }

    /// Derive the time-averaged policy from the strategy-sum table.
    /// Pure read: deriving twice without training in between yields
    /// identical probabilities.
    pub fn average_policy(&self) -> Policy {
        let mut policy = Policy::new();
        for (info, data) in &self.nodes {
            policy.insert(
                info.clone(),
                ActionDistribution {
                    actions: data.actions.clone(),
                    probs: data.average_strategy(),
                },
            );
        }
        policy
    }
}

/// Train a fresh solver, shuffling with thread-local randomness.
pub fn train(config: GameConfig, iterations: u64) -> OclResult<Policy> {
    let mut solver = CfrSolver::new(config);
    solver.train(iterations, &mut rand::thread_rng())
}

/// Deterministic variant of [`train`].
pub fn train_seeded(config: GameConfig, iterations: u64, seed: u64) -> OclResult<Policy> {
    let mut solver = CfrSolver::new(config);
    solver.train(iterations, &mut StdRng::seed_from_u64(seed))
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Everything needed to reload a policy or resume training: the config,
/// the averaged policy, both accumulated tables, and the iteration
/// count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedStrategy {
    pub config: GameConfig,
    pub policy: Policy,
    pub regret_sum: HashMap<InfoState, Vec<(Action, f64)>>,
    pub strategy_sum: HashMap<InfoState, Vec<(Action, f64)>>,
    pub iterations: u64,
}

impl TrainedStrategy {
    pub fn from_solver(solver: &CfrSolver) -> Self {
        let mut regret_sum = HashMap::new();
        let mut strategy_sum = HashMap::new();
        for (info, data) in solver.nodes() {
            regret_sum.insert(
                info.clone(),
                data.actions
                    .iter()
                    .copied()
                    .zip(data.regret_sum.iter().copied())
                    .collect(),
            );
            strategy_sum.insert(
                info.clone(),
                data.actions
                    .iter()
                    .copied()
                    .zip(data.strategy_sum.iter().copied())
                    .collect(),
            );
        }
        TrainedStrategy {
            config: solver.config(),
            policy: solver.average_policy(),
            regret_sum,
            strategy_sum,
            iterations: solver.iterations(),
        }
    }

    /// Rebuild a solver positioned to resume training from this record.
    pub fn into_solver(self) -> CfrSolver {
        let mut nodes = HashMap::new();
        for (info, regrets) in self.regret_sum {
            let actions: Vec<Action> = regrets.iter().map(|&(a, _)| a).collect();
            let mut data = InfoStateData::new(actions.clone());
            data.regret_sum = regrets.iter().map(|&(_, r)| r).collect();
            if let Some(weights) = self.strategy_sum.get(&info) {
                data.strategy_sum = actions
                    .iter()
                    .map(|&a| {
                        weights
                            .iter()
                            .find(|&&(wa, _)| wa == a)
                            .map_or(0.0, |&(_, w)| w)
                    })
                    .collect();
            }
            nodes.insert(info, data);
        }
        CfrSolver {
            config: self.config,
            nodes,
            iterations: self.iterations,
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let data = bincode::serialize(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let data = fs::read(path)?;
        bincode::deserialize(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
