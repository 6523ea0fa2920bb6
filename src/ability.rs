pub const INITIAL_ABILITY: f64 = 0.0;
pub const DEFAULT_LEARNING_RATE: f64 = 24.0;
pub const DEFAULT_DIFFICULTY: f64 = 0.0;
pub const LOGISTIC_SCALE: f64 = 400.0;

/// Probability that a learner at `ability` answers an item of `difficulty` correctly.
pub fn expected_success(ability: f64, difficulty: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((difficulty - ability) / LOGISTIC_SCALE))
}

/// One stochastic-gradient step of the ability estimate.
///
/// Callers must reject non-finite `difficulty` before calling; for finite
/// inputs the result is always finite.
pub fn update_ability(ability: f64, correct: bool, difficulty: f64, learning_rate: f64) -> f64 {
    let expected = expected_success(ability, difficulty);
    let observed = if correct { 1.0 } else { 0.0 };
    ability + learning_rate * (observed - expected)
}

/// [`update_ability`] with the default difficulty and learning rate.
pub fn update_ability_default(ability: f64, correct: bool) -> f64 {
    update_ability(ability, correct, DEFAULT_DIFFICULTY, DEFAULT_LEARNING_RATE)
}
