use log::{debug, info};

/// How the tuned parameter relates to the produced point count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Point count grows with the parameter (face resolution, grid size).
    Resolution,
    /// Point count grows as the parameter shrinks (area/edge thresholds).
    Threshold,
}

/// Target window and iteration cap of the calibration search.
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    pub target_min: usize,
    pub target_max: usize,
    pub max_iterations: u32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            target_min: 1_000_000,
            target_max: 2_000_000,
            max_iterations: 10,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CalibrationResult {
    /// The last parameter value tried (the one that produced `points`).
    pub param: f32,
    pub points: usize,
    pub iterations: u32,
    /// Whether `points` landed inside the target window. Non-convergence
    /// is not an error; the caller judges acceptability.
    pub converged: bool,
}

/// Bisection search driving a sampling pass until its point count lands in
/// `[target_min, target_max]`.
///
/// `run` executes one full sampling pass for a parameter value and returns
/// the resulting point count, which must be monotonic in the sense named by
/// `kind`. While one side of the bracket is unknown the parameter is
/// doubled (or halved) into the unexplored region; once both a too-low and
/// a too-high parameter are known, plain bisection takes over. Stops at
/// `max_iterations` without complaint.
pub fn calibrate<F>(
    kind: ParamKind,
    start: f32,
    cal: &Calibration,
    mut run: F,
) -> CalibrationResult
where
    F: FnMut(f32) -> usize,
{
    // Bracket in parameter space: a value known to yield too few points
    // and one known to yield too many.
    let mut under: Option<f32> = None;
    let mut over: Option<f32> = None;
    let mut param = start;
    let mut points = 0;
    let mut iterations = 0;

    while iterations < cal.max_iterations {
        iterations += 1;
        points = run(param);
        debug!("calibration iteration {iterations}: param {param} -> {points} points");

        if points >= cal.target_min && points <= cal.target_max {
            info!("calibration converged after {iterations} iterations at {param}");
            return CalibrationResult {
                param,
                points,
                iterations,
                converged: true,
            };
        }

        if points < cal.target_min {
            under = Some(param);
        } else {
            over = Some(param);
        }

        param = match (under, over, kind) {
            (Some(u), Some(o), _) => 0.5 * (u + o),
            // No upper bound known yet: move further into the unexplored
            // direction by doubling.
            (Some(u), None, ParamKind::Resolution) => u * 2.0,
            (Some(u), None, ParamKind::Threshold) => u * 0.5,
            (None, Some(o), ParamKind::Resolution) => o * 0.5,
            (None, Some(o), ParamKind::Threshold) => o * 2.0,
            (None, None, _) => unreachable!("one bound is set after every run"),
        };
    }

    info!(
        "calibration stopped at the {} iteration cap with {points} points",
        cal.max_iterations
    );
    CalibrationResult {
        param,
        points,
        iterations,
        converged: false,
    }
}
