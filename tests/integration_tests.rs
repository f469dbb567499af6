//! End-to-end tests exercising `Search` through its public API only.

use planning_core::environment::{Environment, Predictor, ResetOutcome, StepOutcome};
use planning_core::policy::evaluation::{PredictorEstimator, ZeroEstimator};
use planning_core::policy::expansion::DefaultExpansion;
use planning_core::policy::selection::{PuctPolicy, UcbPolicy};
use planning_core::policy::tree_eval::{QSoftmaxPolicy, TreeEvaluationPolicy, VisitCountPolicy};
use planning_core::{ExpansionMode, Search, SearchConfig};

/// A bidirectional corridor: positions `0..length`, action 0 moves left,
/// action 1 moves right. Reaching either end terminates the episode;
/// anything else truncates after `max_steps`.
#[derive(Clone)]
struct Corridor {
    position: i32,
    length: i32,
    steps: u32,
    max_steps: u32,
}

impl Environment for Corridor {
    type Observation = i32;

    fn action_space_size(&self) -> usize {
        2
    }

    fn step(&mut self, action: usize) -> StepOutcome<i32> {
        self.position += if action == 1 { 1 } else { -1 };
        self.position = self.position.clamp(0, self.length - 1);
        self.steps += 1;

        let reached_goal = self.position == self.length - 1;
        let reached_pit = self.position == 0;
        let terminated = reached_goal || reached_pit;
        let truncated = !terminated && self.steps >= self.max_steps;
        let reward = if reached_goal {
            1.0
        } else if reached_pit {
            -1.0
        } else {
            0.0
        };

        StepOutcome {
            observation: Some(self.position),
            reward,
            terminated,
            truncated,
        }
    }

    fn reset(&mut self, _seed: u64) -> ResetOutcome<i32> {
        self.position = self.length / 2;
        self.steps = 0;
        ResetOutcome { observation: self.position }
    }
}

#[test]
fn corridor_search_produces_a_well_formed_action_distribution() {
    let env = Corridor { position: 2, length: 5, steps: 0, max_steps: 20 };
    let config = SearchConfig::default().with_budget(400).with_seed(3);
    let mut search = Search::new(config, UcbPolicy::new(1.4), DefaultExpansion::new(), ZeroEstimator::new());

    let root = search.search(&env, Some(env.position), 0.0).unwrap();
    assert_eq!(root.visits, 400);

    let dist = VisitCountPolicy::new().distribution(&root);
    let total: f64 = dist.probs.iter().sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(dist.argmax_action().is_some());
}

/// Two terminal actions with identical (zero) reward, so a `PuctPolicy`'s
/// exploration term is driven entirely by the prior. A strongly skewed
/// prior should pull visitation toward the favored action even though
/// neither action's value ever differs.
#[derive(Clone)]
struct TwoArmsEqualReward;

impl Environment for TwoArmsEqualReward {
    type Observation = ();

    fn action_space_size(&self) -> usize {
        2
    }

    fn step(&mut self, _action: usize) -> StepOutcome<()> {
        StepOutcome { observation: None, reward: 0.0, terminated: true, truncated: false }
    }

    fn reset(&mut self, _seed: u64) -> ResetOutcome<()> {
        ResetOutcome { observation: () }
    }
}

#[derive(Clone)]
struct FixedPrior {
    prior: Vec<f32>,
}

impl Predictor<()> for FixedPrior {
    fn evaluate(&self, _observation: &()) -> (f32, Vec<f32>) {
        (0.0, self.prior.clone())
    }
}

#[test]
fn puct_prior_skews_visitation_toward_the_favored_action() {
    let env = TwoArmsEqualReward;
    let config = SearchConfig::default().with_budget(300).with_seed(11);
    let predictor = FixedPrior { prior: vec![0.01, 0.99] };
    let mut search = Search::new(
        config,
        PuctPolicy::new(1.0),
        DefaultExpansion::new(),
        PredictorEstimator::new(predictor),
    );

    let root = search.search(&env, Some(()), 0.0).unwrap();
    let visits_low_prior = root.step(0).unwrap().visits;
    let visits_high_prior = root.step(1).unwrap().visits;
    assert!(visits_high_prior > visits_low_prior);
}

#[test]
fn predictor_estimator_sets_root_value_and_prior() {
    let env = TwoArmsEqualReward;
    let config = SearchConfig::default().with_budget(1).with_seed(0);
    let predictor = FixedPrior { prior: vec![0.25, 0.75] };
    let mut search = Search::new(
        config,
        PuctPolicy::new(1.0),
        DefaultExpansion::new(),
        PredictorEstimator::new(predictor),
    );

    let root = search.search(&env, Some(()), 0.0).unwrap();
    assert_eq!(root.value_evaluation, 0.0);
    assert_eq!(root.prior, Some(vec![0.25, 0.75]));
}

/// A single-step, two-action game: action 1 wins (+1), action 0 loses
/// (-1). Deterministic rewards mean UCB's optimal-arm guarantee applies
/// cleanly, so both `VisitCountPolicy` and a zero-temperature
/// `QSoftmaxPolicy` should settle on the winning action.
#[derive(Clone)]
struct OneShotGame;

impl Environment for OneShotGame {
    type Observation = ();

    fn action_space_size(&self) -> usize {
        2
    }

    fn step(&mut self, action: usize) -> StepOutcome<()> {
        let reward = if action == 1 { 1.0 } else { -1.0 };
        StepOutcome { observation: None, reward, terminated: true, truncated: false }
    }

    fn reset(&mut self, _seed: u64) -> ResetOutcome<()> {
        ResetOutcome { observation: () }
    }
}

#[test]
fn tree_evaluation_policies_agree_on_the_winning_action() {
    let env = OneShotGame;
    let config = SearchConfig::default().with_budget(300).with_seed(5);
    let mut search = Search::new(config, UcbPolicy::new(1.0), DefaultExpansion::new(), ZeroEstimator::new());
    let root = search.search(&env, Some(()), 0.0).unwrap();

    assert_eq!(VisitCountPolicy::new().distribution(&root).argmax_action(), Some(1));
    assert_eq!(
        QSoftmaxPolicy::new(Some(0.0)).distribution(&root).argmax_action(),
        Some(1)
    );
}

#[test]
fn identical_seeds_reproduce_identical_statistics() {
    let env = Corridor { position: 2, length: 5, steps: 0, max_steps: 20 };

    let run = |seed| {
        let config = SearchConfig::default().with_budget(250).with_seed(seed);
        let mut search = Search::new(config, UcbPolicy::new(1.4), DefaultExpansion::new(), ZeroEstimator::new());
        search.search(&env, Some(env.position), 0.0).unwrap()
    };

    let a = run(77);
    let b = run(77);
    assert_eq!(a.visits, b.visits);
    assert_eq!(a.subtree_sum, b.subtree_sum);

    let dist_a = VisitCountPolicy::new().distribution(&a);
    let dist_b = VisitCountPolicy::new().distribution(&b);
    assert_eq!(dist_a.probs, dist_b.probs);
}

/// Four terminal actions with distinct deterministic rewards. Under
/// all-children expansion the first visit to any non-fully-expanded node
/// expands every remaining action, so the root's visit count overshoots
/// the configured budget by construction.
#[derive(Clone)]
struct FourArms;

impl Environment for FourArms {
    type Observation = ();

    fn action_space_size(&self) -> usize {
        4
    }

    fn step(&mut self, action: usize) -> StepOutcome<()> {
        let reward = action as f32 * 0.1;
        StepOutcome { observation: None, reward, terminated: true, truncated: false }
    }

    fn reset(&mut self, _seed: u64) -> ResetOutcome<()> {
        ResetOutcome { observation: () }
    }
}

#[test]
fn all_children_expansion_overshoots_the_visit_budget() {
    let env = FourArms;
    let config = SearchConfig::default()
        .with_budget(3)
        .with_seed(1)
        .with_expansion_mode(ExpansionMode::AllChildren);
    let mut search = Search::new(config, UcbPolicy::new(1.0), DefaultExpansion::new(), ZeroEstimator::new());

    let root = search.search(&env, Some(()), 0.0).unwrap();
    // root self-eval (1) + one backup per expanded action (4) = 5.
    assert_eq!(root.visits, 5);
    assert_eq!(root.expanded_count(), 4);
}

/// A single-action environment: every node in the tree is a linear chain.
/// Under single-child expansion, the recurring-terminal-backup path means
/// root visits still land exactly on the budget.
#[derive(Clone)]
struct SingleAction {
    remaining: u32,
}

impl Environment for SingleAction {
    type Observation = ();

    fn action_space_size(&self) -> usize {
        1
    }

    fn step(&mut self, _action: usize) -> StepOutcome<()> {
        self.remaining = self.remaining.saturating_sub(1);
        let done = self.remaining == 0;
        StepOutcome { observation: Some(()), reward: if done { 1.0 } else { 0.0 }, terminated: done, truncated: false }
    }

    fn reset(&mut self, _seed: u64) -> ResetOutcome<()> {
        self.remaining = 3;
        ResetOutcome { observation: () }
    }
}

#[test]
fn single_action_environment_still_lands_exactly_on_budget() {
    let env = SingleAction { remaining: 3 };
    let config = SearchConfig::default().with_budget(100).with_seed(0);
    let mut search = Search::new(config, UcbPolicy::new(1.4), DefaultExpansion::new(), ZeroEstimator::new());

    let root = search.search(&env, Some(()), 0.0).unwrap();
    assert_eq!(root.visits, 100);
}

/// A 4x4 grid, non-slippery, goal at `(3, 3)`. The agent starts one cell
/// left of the goal, so the direct action's subtree value (`+1`, reached in
/// a single discounted step) strictly dominates every indirect path back to
/// the goal (worth at most `0.9^k` for a `k`-step detour, `k >= 2`),
/// regardless of how much any other subtree gets explored.
#[derive(Clone)]
struct GridWorld {
    x: i32,
    y: i32,
    goal: (i32, i32),
    steps: u32,
    max_steps: u32,
}

impl Environment for GridWorld {
    type Observation = (i32, i32);

    fn action_space_size(&self) -> usize {
        4
    }

    fn step(&mut self, action: usize) -> StepOutcome<(i32, i32)> {
        let (dx, dy) = match action {
            0 => (0, 1),
            1 => (0, -1),
            2 => (-1, 0),
            _ => (1, 0),
        };
        self.x = (self.x + dx).clamp(0, 3);
        self.y = (self.y + dy).clamp(0, 3);
        self.steps += 1;

        let reached_goal = (self.x, self.y) == self.goal;
        let truncated = !reached_goal && self.steps >= self.max_steps;
        StepOutcome {
            observation: Some((self.x, self.y)),
            reward: if reached_goal { 1.0 } else { 0.0 },
            terminated: reached_goal,
            truncated,
        }
    }

    fn reset(&mut self, _seed: u64) -> ResetOutcome<(i32, i32)> {
        self.x = 0;
        self.y = 0;
        self.steps = 0;
        ResetOutcome { observation: (self.x, self.y) }
    }
}

#[test]
fn grid_world_visit_count_policy_moves_toward_the_goal() {
    let env = GridWorld { x: 2, y: 3, goal: (3, 3), steps: 0, max_steps: 20 };
    let config = SearchConfig::default()
        .with_discount_factor(0.9)
        .with_budget(200)
        .with_seed(1);
    let mut search = Search::new(config, UcbPolicy::new(1.4), DefaultExpansion::new(), ZeroEstimator::new());

    let root = search.search(&env, Some((env.x, env.y)), 0.0).unwrap();

    // action 3 (right) steps directly onto the goal.
    assert_eq!(VisitCountPolicy::new().distribution(&root).argmax_action(), Some(3));
    assert!(root.default_value() > 0.0);
}

/// PUCT with a uniform prior (no learned estimator sets one, so `PuctPolicy`
/// falls back to `1/A`) and UCB with a matched exploration constant
/// (`c' = c * A`, compensating PUCT's extra `prior[a]` factor) should agree
/// on which action dominates visitation on a symmetric, single-step game,
/// even though the two formulas' exact visit-count ratios differ.
#[test]
fn puct_with_uniform_prior_and_ucb_with_a_matched_constant_agree_on_the_winning_action() {
    let env = OneShotGame;
    let c = 1.0;
    let matched_c_prime = c * env.action_space_size() as f64;

    let ucb_config = SearchConfig::default().with_budget(300).with_seed(5);
    let mut ucb_search = Search::new(ucb_config, UcbPolicy::new(c), DefaultExpansion::new(), ZeroEstimator::new());
    let ucb_root = ucb_search.search(&env, Some(()), 0.0).unwrap();

    let puct_config = SearchConfig::default().with_budget(300).with_seed(5);
    let mut puct_search = Search::new(
        puct_config,
        PuctPolicy::new(matched_c_prime),
        DefaultExpansion::new(),
        ZeroEstimator::new(),
    );
    let puct_root = puct_search.search(&env, Some(()), 0.0).unwrap();

    assert!(ucb_root.step(1).unwrap().visits > ucb_root.step(0).unwrap().visits);
    assert!(puct_root.step(1).unwrap().visits > puct_root.step(0).unwrap().visits);
}

/// Chain MDP of length 5, only the rightmost transition rewarding and
/// terminal. Exercises `RandomRolloutEstimator` end to end through a full
/// `Search::search` run (rather than only in isolation), with the rollout
/// budget of 10.
#[derive(Clone)]
struct FiveChain {
    position: u32,
}

impl Environment for FiveChain {
    type Observation = u32;

    fn action_space_size(&self) -> usize {
        2
    }

    fn step(&mut self, action: usize) -> StepOutcome<u32> {
        if action == 1 && self.position + 1 < 5 {
            self.position += 1;
        }
        let done = self.position + 1 == 5;
        StepOutcome {
            observation: Some(self.position),
            reward: if done { 1.0 } else { 0.0 },
            terminated: done,
            truncated: false,
        }
    }

    fn reset(&mut self, _seed: u64) -> ResetOutcome<u32> {
        self.position = 0;
        ResetOutcome { observation: 0 }
    }
}

#[test]
fn random_rollout_estimator_drives_a_full_search_over_a_chain_mdp() {
    use planning_core::policy::evaluation::RandomRolloutEstimator;

    let env = FiveChain { position: 0 };
    let config = SearchConfig::default().with_budget(500).with_seed(3);
    let mut search = Search::new(
        config,
        UcbPolicy::new(1.4),
        DefaultExpansion::new(),
        RandomRolloutEstimator::new(10),
    );

    let root = search.search(&env, Some(0), 0.0).unwrap();
    assert_eq!(root.visits, 500);

    let dist = VisitCountPolicy::new().distribution(&root);
    let total: f64 = dist.probs.iter().sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(dist.argmax_action().is_some());
}
