//! Trajectory executor state machine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info, trace, warn};
use std::mem;

// Internal
use super::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Completion fraction reported while no trajectory is executing.
pub const IDLE_COMPLETION_FRACTION: f64 = -1.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Executes trajectories against the downtrack distance reported by the position feed.
///
/// The executor owns the current trajectory and at most one queued trajectory. The queued
/// trajectory is swapped in as soon as the current one has no maneuvers left on either axis, so
/// the planner can hand over the next trajectory ahead of time without a gap in actuation.
///
/// All operations are synchronous. Progress callbacks are called from inside
/// [`TrajExecutor::update_position`].
#[derive(Debug, Default)]
pub struct TrajExecutor {
    params: TrajExecParams,

    /// Last accepted downtrack distance, `None` until the first position update.
    downtrack_m: Option<f64>,

    state: ExecState,

    callbacks: ProgressCallbacks,
}

/// A trajectory being executed, plus the one waiting to follow it.
#[derive(Debug)]
pub struct ActiveTrajectory {
    current: Box<dyn Trajectory>,

    queued: Option<Box<dyn Trajectory>>,

    /// The maneuver currently assigned to each axis, `None` if the axis is inactive.
    bound: PerAxis<Option<ManeuverHandle>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Execution state.
#[derive(Debug)]
pub enum ExecState {
    /// No trajectory is executing. Position updates are recorded but do nothing else.
    Idle,

    /// A trajectory is executing.
    Active(ActiveTrajectory),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ExecState {
    fn default() -> Self {
        ExecState::Idle
    }
}

impl TrajExecutor {
    /// Create a new idle executor.
    pub fn new(params: TrajExecParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Submit a trajectory for execution.
    ///
    /// If the executor is idle the trajectory starts executing immediately, the maneuvers covering
    /// the present downtrack distance being assigned to each axis. They are started on the next
    /// position update.
    ///
    /// Otherwise the trajectory is queued behind the current one, replacing any trajectory which
    /// was already queued. The current trajectory is not affected.
    ///
    /// Zero length trajectories are rejected since their completion cannot be calculated.
    pub fn submit(&mut self, trajectory: Box<dyn Trajectory>) -> Result<(), TrajExecError> {
        let start_m = trajectory.start_location();
        let end_m = trajectory.end_location();

        if start_m == end_m {
            return Err(TrajExecError::DegenerateTrajectory { start_m, end_m });
        }

        let downtrack_m = self.downtrack_distance();

        match self.state {
            ExecState::Idle => {
                let active = ActiveTrajectory::new(trajectory, downtrack_m);

                info!(
                    "Executing trajectory [{}, {}] m from {} m (lateral: {:?}, longitudinal: {:?})",
                    start_m, end_m, downtrack_m, active.bound.lateral, active.bound.longitudinal
                );

                self.state = ExecState::Active(active);
                self.callbacks.reset_all();
            }
            ExecState::Active(ref mut active) => {
                if let Some(stale) = active.queued.replace(trajectory) {
                    warn!(
                        "Discarding queued trajectory [{}, {}] m, replaced by [{}, {}] m",
                        stale.start_location(),
                        stale.end_location(),
                        start_m,
                        end_m
                    );
                } else {
                    info!("Queued trajectory [{}, {}] m", start_m, end_m);
                }
            }
        }

        Ok(())
    }

    /// Process a new downtrack distance.
    ///
    /// This is the executor's only periodic entry point. When a trajectory is executing:
    ///
    ///  1. Assigned maneuvers whose start has been reached are started.
    ///  1. Progress callbacks whose threshold has been reached are fired.
    ///  1. Maneuvers whose end has been reached are stopped, and the maneuver starting where they
    ///     ended is assigned and started if its start has been reached. This repeats until the
    ///     assigned maneuver's end lies ahead, so a single large jump can pass through several
    ///     maneuvers.
    ///  1. If neither axis has a maneuver left the queued trajectory is swapped in and its
    ///     maneuvers started, or the executor goes idle if nothing is queued.
    ///
    /// Non-finite distances are rejected without changing any state.
    ///
    /// A maneuver which fails to start or stop leaves its axis inactive. Processing carries on
    /// for the other axis and the first error is returned once the update is complete.
    pub fn update_position(&mut self, downtrack_m: f64) -> Result<(), TrajExecError> {
        let downtrack_m = self.apply_regression_policy(downtrack_m)?;
        self.downtrack_m = Some(downtrack_m);

        let active = match self.state {
            ExecState::Idle => {
                trace!("No trajectory executing at {} m", downtrack_m);
                return Ok(());
            }
            ExecState::Active(ref mut active) => active,
        };

        let mut result = active.start_reached(downtrack_m);

        let fraction = active.completion_fraction(downtrack_m)?;
        self.callbacks.notify(fraction);

        for &axis in Axis::ALL.iter() {
            result = result.and(active.finish_reached(axis, downtrack_m));
        }

        if active.bound.lateral.is_none() && active.bound.longitudinal.is_none() {
            match active.queued.take() {
                Some(next) => {
                    info!(
                        "Trajectory [{}, {}] m complete, swapping to queued trajectory [{}, {}] m",
                        active.current.start_location(),
                        active.current.end_location(),
                        next.start_location(),
                        next.end_location()
                    );

                    *active = ActiveTrajectory::new(next, downtrack_m);
                    self.callbacks.reset_all();

                    result = result.and(active.start_reached(downtrack_m));
                }
                None => {
                    info!(
                        "Trajectory [{}, {}] m complete, no trajectory queued",
                        active.current.start_location(),
                        active.current.end_location()
                    );

                    self.state = ExecState::Idle;
                }
            }
        }

        result
    }

    /// Stop any running maneuvers and drop both the current and queued trajectories.
    ///
    /// The last downtrack distance is forgotten, so the next position update is taken as it is
    /// whatever the regression policy. Does nothing while idle. Failures to stop a maneuver are
    /// logged.
    pub fn abort(&mut self) {
        let mut active = match mem::replace(&mut self.state, ExecState::Idle) {
            ExecState::Idle => return,
            ExecState::Active(active) => active,
        };

        self.downtrack_m = None;

        info!(
            "Aborting trajectory [{}, {}] m{}",
            active.current.start_location(),
            active.current.end_location(),
            if active.queued.is_some() {
                " and the queued trajectory"
            } else {
                ""
            }
        );

        for &axis in Axis::ALL.iter() {
            let handle = match active.bound[axis] {
                Some(h) => h,
                None => continue,
            };

            match active.current.maneuver_mut(handle) {
                Some(maneuver) if maneuver.is_running() => {
                    debug!("Stopping {} maneuver", axis);
                    if let Err(e) = maneuver.stop() {
                        error!("Could not stop the {} maneuver during abort: {}", axis, e);
                    }
                }
                Some(_) => (),
                None => error!("Aborted trajectory has no maneuver for {:?}", handle),
            }
        }
    }

    /// Fraction of the current trajectory completed.
    ///
    /// The fraction is not clamped, it is negative before the trajectory's start and greater
    /// than one past its end. Returns [`IDLE_COMPLETION_FRACTION`] while idle.
    pub fn completion_fraction(&self) -> Result<f64, TrajExecError> {
        match self.state {
            ExecState::Idle => Ok(IDLE_COMPLETION_FRACTION),
            ExecState::Active(ref active) => active.completion_fraction(self.downtrack_distance()),
        }
    }

    /// Register a callback to be fired when the completion fraction of a trajectory reaches
    /// `threshold`.
    ///
    /// Each callback fires at most once per trajectory.
    pub fn register_progress_callback<F>(&mut self, threshold: f64, callback: F) -> CallbackId
    where
        F: FnMut(f64) + 'static,
    {
        self.callbacks.register(threshold, callback)
    }

    /// The maneuver assigned to `axis`, if any.
    pub fn current_maneuver(&self, axis: Axis) -> Option<&dyn Maneuver> {
        match self.state {
            ExecState::Idle => None,
            ExecState::Active(ref active) => active.bound[axis].and_then(|h| active.current.maneuver(h)),
        }
    }

    /// The earliest maneuver on `axis` which starts at or after the present downtrack distance.
    pub fn next_maneuver(&self, axis: Axis) -> Option<&dyn Maneuver> {
        match self.state {
            ExecState::Idle => None,
            ExecState::Active(ref active) => active
                .current
                .next_maneuver_after(self.downtrack_distance(), axis)
                .and_then(|h| active.current.maneuver(h)),
        }
    }

    /// The trajectory being executed, if any.
    pub fn current_trajectory(&self) -> Option<&dyn Trajectory> {
        match self.state {
            ExecState::Idle => None,
            ExecState::Active(ref active) => Some(&*active.current),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ExecState::Idle)
    }

    pub fn has_queued_trajectory(&self) -> bool {
        match self.state {
            ExecState::Idle => false,
            ExecState::Active(ref active) => active.queued.is_some(),
        }
    }

    /// The last accepted downtrack distance, or zero before the first position update.
    pub fn downtrack_distance(&self) -> f64 {
        self.downtrack_m.unwrap_or(0.0)
    }

    pub fn params(&self) -> &TrajExecParams {
        &self.params
    }

    /// Decide which distance to use for this update.
    fn apply_regression_policy(&self, new_m: f64) -> Result<f64, TrajExecError> {
        if !new_m.is_finite() {
            return Err(TrajExecError::NonFiniteDistance(new_m));
        }

        let previous_m = match self.downtrack_m {
            Some(d) => d,
            None => return Ok(new_m),
        };

        if new_m >= previous_m - self.params.regression_tolerance_m {
            return Ok(new_m);
        }

        match self.params.regression_policy {
            RegressionPolicy::Accept => {
                warn!(
                    "Downtrack distance regressed from {} m to {} m",
                    previous_m, new_m
                );
                Ok(new_m)
            }
            RegressionPolicy::Hold => {
                warn!(
                    "Downtrack distance regressed from {} m to {} m, holding {} m",
                    previous_m, new_m, previous_m
                );
                Ok(previous_m)
            }
            RegressionPolicy::Reject => Err(TrajExecError::DistanceRegression {
                previous_m,
                new_m,
            }),
        }
    }
}

impl ActiveTrajectory {
    /// Activate `trajectory`, assigning the maneuvers covering `downtrack_m`.
    fn new(trajectory: Box<dyn Trajectory>, downtrack_m: f64) -> Self {
        let bound = PerAxis::from_fn(|axis| trajectory.maneuver_covering(downtrack_m, axis));

        Self {
            current: trajectory,
            queued: None,
            bound,
        }
    }

    fn completion_fraction(&self, downtrack_m: f64) -> Result<f64, TrajExecError> {
        let start_m = self.current.start_location();
        let end_m = self.current.end_location();

        if start_m == end_m {
            return Err(TrajExecError::DegenerateTrajectory { start_m, end_m });
        }

        Ok((downtrack_m - start_m) / (end_m - start_m))
    }

    /// Start every assigned maneuver whose start has been reached.
    fn start_reached(&mut self, downtrack_m: f64) -> Result<(), TrajExecError> {
        let mut result = Ok(());

        for &axis in Axis::ALL.iter() {
            result = result.and(self.start_if_reached(axis, downtrack_m));
        }

        result
    }

    fn start_if_reached(&mut self, axis: Axis, downtrack_m: f64) -> Result<(), TrajExecError> {
        let handle = match self.bound[axis] {
            Some(h) => h,
            None => return Ok(()),
        };

        let maneuver = match self.current.maneuver_mut(handle) {
            Some(m) => m,
            None => {
                self.bound[axis] = None;
                return Err(TrajExecError::UnknownManeuver(handle));
            }
        };

        if downtrack_m < maneuver.start_location() || maneuver.is_running() {
            return Ok(());
        }

        debug!(
            "Starting {} maneuver [{}, {}) m at {} m",
            axis,
            maneuver.start_location(),
            maneuver.end_location(),
            downtrack_m
        );

        if let Err(source) = maneuver.start() {
            self.bound[axis] = None;
            return Err(TrajExecError::Maneuver { axis, source });
        }

        Ok(())
    }

    /// Stop the maneuver on `axis` if its end has been reached, moving on through the maneuvers
    /// which follow it until one is found whose end lies ahead.
    fn finish_reached(&mut self, axis: Axis, downtrack_m: f64) -> Result<(), TrajExecError> {
        while let Some(handle) = self.bound[axis] {
            let maneuver = match self.current.maneuver_mut(handle) {
                Some(m) => m,
                None => {
                    self.bound[axis] = None;
                    return Err(TrajExecError::UnknownManeuver(handle));
                }
            };

            let end_m = maneuver.end_location();
            if downtrack_m < end_m {
                break;
            }

            debug!(
                "Stopping {} maneuver [{}, {}) m at {} m",
                axis,
                maneuver.start_location(),
                end_m,
                downtrack_m
            );

            if let Err(source) = maneuver.stop() {
                self.bound[axis] = None;
                return Err(TrajExecError::Maneuver { axis, source });
            }

            let next = self.current.maneuver_covering(end_m, axis);
            self.bound[axis] = next;

            let next_end_m = match next.and_then(|h| self.current.maneuver(h)) {
                Some(m) => m.end_location(),
                None => {
                    debug!("No {} maneuver follows {} m", axis, end_m);
                    break;
                }
            };

            // The successor must end further on or this loop would never exit
            if next_end_m <= end_m {
                self.bound[axis] = None;
                return Err(TrajExecError::NonProgressingManeuver(axis, end_m));
            }

            self.start_if_reached(axis, downtrack_m)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Started(&'static str),
        Stopped(&'static str),
    }

    type EventLog = Rc<RefCell<Vec<Event>>>;

    /// Maneuver which records its starts and stops.
    #[derive(Debug)]
    struct Recorder {
        name: &'static str,
        axis: Axis,
        start_m: f64,
        end_m: f64,
        running: bool,
        fail_start: bool,
        fail_stop: bool,
        log: EventLog,
    }

    impl Maneuver for Recorder {
        fn axis(&self) -> Axis {
            self.axis
        }

        fn start_location(&self) -> f64 {
            self.start_m
        }

        fn end_location(&self) -> f64 {
            self.end_m
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn start(&mut self) -> Result<(), ManeuverError> {
            if self.fail_start {
                return Err(ManeuverError::Rejected(String::from("refused")));
            }

            self.running = true;
            self.log.borrow_mut().push(Event::Started(self.name));
            Ok(())
        }

        fn stop(&mut self) -> Result<(), ManeuverError> {
            if self.fail_stop {
                return Err(ManeuverError::Rejected(String::from("stuck")));
            }

            if self.running {
                self.running = false;
                self.log.borrow_mut().push(Event::Stopped(self.name));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Fixture {
        log: EventLog,
    }

    impl Fixture {
        fn recorder(&self, name: &'static str, axis: Axis, start_m: f64, end_m: f64) -> Recorder {
            Recorder {
                name,
                axis,
                start_m,
                end_m,
                running: false,
                fail_start: false,
                fail_stop: false,
                log: self.log.clone(),
            }
        }

        fn traj(
            &self,
            start_m: f64,
            end_m: f64,
            maneuvers: &[(&'static str, Axis, f64, f64)],
        ) -> Box<dyn Trajectory> {
            let mut traj = PlannedTrajectory::new(start_m, end_m).unwrap();

            for &(name, axis, s, e) in maneuvers {
                traj.add_maneuver(Box::new(self.recorder(name, axis, s, e)))
                    .unwrap();
            }

            Box::new(traj)
        }

        fn events(&self) -> Vec<Event> {
            self.log.borrow().clone()
        }
    }

    use comms_if::eqpt::actuation::Axis::{Lateral, Longitudinal};
    use self::Event::{Started, Stopped};

    #[test]
    fn test_single_maneuver_walkthrough() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::default();

        let fired = Rc::new(RefCell::new(Vec::new()));
        let f = fired.clone();
        exec.register_progress_callback(0.5, move |frac| f.borrow_mut().push(frac));

        exec.submit(fx.traj(0.0, 10.0, &[("a", Lateral, 0.0, 10.0)]))
            .unwrap();
        assert!(!exec.is_idle());
        assert!(!exec.current_maneuver(Lateral).unwrap().is_running());

        exec.update_position(0.0).unwrap();
        assert_eq!(fx.events(), vec![Started("a")]);
        assert!(exec.current_maneuver(Lateral).unwrap().is_running());
        assert!(exec.current_maneuver(Longitudinal).is_none());
        assert_eq!(exec.completion_fraction().unwrap(), 0.0);

        exec.update_position(4.0).unwrap();
        assert_eq!(exec.completion_fraction().unwrap(), 0.4);
        assert!(fired.borrow().is_empty());
        assert_eq!(fx.events(), vec![Started("a")]);

        exec.update_position(5.0).unwrap();
        assert_eq!(*fired.borrow(), vec![0.5]);

        exec.update_position(10.0).unwrap();
        assert_eq!(fx.events(), vec![Started("a"), Stopped("a")]);
        assert!(exec.is_idle());
        assert_eq!(exec.completion_fraction().unwrap(), -1.0);
        assert_eq!(*fired.borrow(), vec![0.5]);
    }

    #[test]
    fn test_large_jump_swaps_to_queued() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::default();

        exec.submit(fx.traj(
            0.0,
            100.0,
            &[
                ("lat0", Lateral, 0.0, 50.0),
                ("lat1", Lateral, 50.0, 100.0),
                ("long", Longitudinal, 0.0, 100.0),
            ],
        ))
        .unwrap();

        exec.update_position(0.0).unwrap();
        exec.update_position(40.0).unwrap();
        assert_eq!(fx.events(), vec![Started("lat0"), Started("long")]);

        exec.submit(fx.traj(100.0, 150.0, &[("next", Lateral, 100.0, 130.0)]))
            .unwrap();
        assert!(exec.has_queued_trajectory());
        assert_eq!(fx.events().len(), 2);

        exec.update_position(100.0).unwrap();
        assert_eq!(
            fx.events(),
            vec![
                Started("lat0"),
                Started("long"),
                Stopped("lat0"),
                Started("lat1"),
                Stopped("lat1"),
                Stopped("long"),
                Started("next"),
            ]
        );

        assert!(!exec.has_queued_trajectory());
        assert_eq!(exec.current_trajectory().unwrap().start_location(), 100.0);
        let lat = exec.current_maneuver(Lateral).unwrap();
        assert_eq!(lat.start_location(), 100.0);
        assert!(lat.is_running());
        assert!(exec.current_maneuver(Longitudinal).is_none());
    }

    #[test]
    fn test_repeated_update_is_idempotent() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::default();

        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        exec.register_progress_callback(0.2, move |_| *c.borrow_mut() += 1);

        exec.submit(fx.traj(0.0, 10.0, &[("a", Lateral, 0.0, 10.0)]))
            .unwrap();

        exec.update_position(5.0).unwrap();
        let events = fx.events();
        exec.update_position(5.0).unwrap();
        exec.update_position(5.0).unwrap();

        assert_eq!(fx.events(), events);
        assert_eq!(*count.borrow(), 1);
        assert!(exec.current_maneuver(Lateral).unwrap().is_running());
    }

    #[test]
    fn test_callbacks_rearm_on_swap() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::default();

        let fired = Rc::new(RefCell::new(Vec::new()));
        let f = fired.clone();
        exec.register_progress_callback(0.5, move |frac| f.borrow_mut().push(frac));

        exec.submit(fx.traj(0.0, 10.0, &[("a", Lateral, 0.0, 10.0)]))
            .unwrap();
        exec.submit(fx.traj(10.0, 20.0, &[("b", Lateral, 10.0, 20.0)]))
            .unwrap();

        exec.update_position(6.0).unwrap();
        exec.update_position(10.0).unwrap();
        exec.update_position(16.0).unwrap();

        assert_eq!(*fired.borrow(), vec![0.6, 0.6]);
    }

    #[test]
    fn test_abort() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::default();

        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        exec.register_progress_callback(0.5, move |_| *c.borrow_mut() += 1);

        // Abort while idle does nothing
        exec.abort();
        assert!(exec.is_idle());

        exec.submit(fx.traj(
            0.0,
            10.0,
            &[("lat", Lateral, 0.0, 10.0), ("long", Longitudinal, 5.0, 10.0)],
        ))
        .unwrap();
        exec.submit(fx.traj(10.0, 20.0, &[("queued", Lateral, 10.0, 20.0)]))
            .unwrap();
        exec.update_position(2.0).unwrap();

        exec.abort();
        assert!(exec.is_idle());
        assert!(!exec.has_queued_trajectory());
        assert!(exec.current_maneuver(Lateral).is_none());
        assert!(exec.next_maneuver(Lateral).is_none());

        // Only the running maneuver is stopped
        assert_eq!(fx.events(), vec![Started("lat"), Stopped("lat")]);

        exec.update_position(8.0).unwrap();
        exec.update_position(15.0).unwrap();
        assert_eq!(fx.events().len(), 2);
        assert_eq!(*count.borrow(), 0);
        assert_eq!(exec.downtrack_distance(), 15.0);
    }

    #[test]
    fn test_submit_while_active_only_queues() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::default();

        exec.submit(fx.traj(0.0, 10.0, &[("a", Lateral, 0.0, 10.0)]))
            .unwrap();
        exec.update_position(3.0).unwrap();

        exec.submit(fx.traj(10.0, 20.0, &[("stale", Lateral, 10.0, 20.0)]))
            .unwrap();
        exec.submit(fx.traj(10.0, 30.0, &[("fresh", Lateral, 10.0, 30.0)]))
            .unwrap();

        assert_eq!(exec.current_trajectory().unwrap().end_location(), 10.0);
        assert_eq!(exec.current_maneuver(Lateral).unwrap().end_location(), 10.0);
        assert_eq!(fx.events(), vec![Started("a")]);

        // The later submission replaced the earlier one
        exec.update_position(10.0).unwrap();
        assert_eq!(exec.current_trajectory().unwrap().end_location(), 30.0);
        assert_eq!(fx.events(), vec![Started("a"), Stopped("a"), Started("fresh")]);
    }

    #[test]
    fn test_fraction_is_unclamped() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::default();

        exec.update_position(50.0).unwrap();
        exec.submit(fx.traj(100.0, 200.0, &[])).unwrap();
        assert_eq!(exec.completion_fraction().unwrap(), -0.5);

        exec.abort();
        exec.update_position(250.0).unwrap();
        exec.submit(fx.traj(100.0, 200.0, &[])).unwrap();
        assert_eq!(exec.completion_fraction().unwrap(), 1.5);

        // Nothing to execute so the next update finishes the trajectory
        exec.update_position(250.0).unwrap();
        assert!(exec.is_idle());
    }

    #[test]
    fn test_degenerate_trajectory_rejected() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::default();

        assert!(matches!(
            exec.submit(fx.traj(5.0, 5.0, &[])),
            Err(TrajExecError::DegenerateTrajectory { .. })
        ));
        assert!(exec.is_idle());
    }

    #[test]
    fn test_regression_policies() {
        let fx = Fixture::default();

        let mut accept = TrajExecutor::default();
        accept
            .submit(fx.traj(0.0, 10.0, &[("a", Lateral, 0.0, 10.0)]))
            .unwrap();
        accept.update_position(5.0).unwrap();
        accept.update_position(3.0).unwrap();
        assert_eq!(accept.downtrack_distance(), 3.0);
        assert!(accept.current_maneuver(Lateral).unwrap().is_running());

        let mut hold = TrajExecutor::new(TrajExecParams {
            regression_policy: RegressionPolicy::Hold,
            regression_tolerance_m: 0.0,
        });
        hold.update_position(5.0).unwrap();
        hold.update_position(3.0).unwrap();
        assert_eq!(hold.downtrack_distance(), 5.0);

        let mut reject = TrajExecutor::new(TrajExecParams {
            regression_policy: RegressionPolicy::Reject,
            regression_tolerance_m: 0.5,
        });
        reject.update_position(5.0).unwrap();
        reject.update_position(4.6).unwrap();
        assert_eq!(reject.downtrack_distance(), 4.6);
        assert!(matches!(
            reject.update_position(3.0),
            Err(TrajExecError::DistanceRegression { .. })
        ));
        assert_eq!(reject.downtrack_distance(), 4.6);
    }

    #[test]
    fn test_start_failure_deactivates_axis() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::default();

        let mut failing = fx.recorder("lat", Lateral, 0.0, 10.0);
        failing.fail_start = true;

        let mut traj = PlannedTrajectory::new(0.0, 10.0).unwrap();
        traj.add_maneuver(Box::new(failing)).unwrap();
        traj.add_maneuver(Box::new(fx.recorder("long", Longitudinal, 0.0, 10.0)))
            .unwrap();
        exec.submit(Box::new(traj)).unwrap();

        assert!(matches!(
            exec.update_position(1.0),
            Err(TrajExecError::Maneuver { axis: Lateral, .. })
        ));

        // The other axis was still processed
        assert!(exec.current_maneuver(Lateral).is_none());
        assert_eq!(fx.events(), vec![Started("long")]);

        exec.update_position(10.0).unwrap();
        assert!(exec.is_idle());
    }

    #[test]
    fn test_stop_failure_still_swaps() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::default();

        let mut stuck = fx.recorder("a", Lateral, 0.0, 10.0);
        stuck.fail_stop = true;

        let mut traj = PlannedTrajectory::new(0.0, 10.0).unwrap();
        traj.add_maneuver(Box::new(stuck)).unwrap();
        exec.submit(Box::new(traj)).unwrap();
        exec.submit(fx.traj(10.0, 20.0, &[("b", Lateral, 10.0, 20.0)]))
            .unwrap();

        exec.update_position(0.0).unwrap();

        assert!(matches!(
            exec.update_position(10.0),
            Err(TrajExecError::Maneuver { axis: Lateral, .. })
        ));

        // The failed axis was dropped and the queued trajectory took over
        assert!(!exec.has_queued_trajectory());
        assert_eq!(exec.current_trajectory().unwrap().start_location(), 10.0);
        assert_eq!(exec.current_maneuver(Lateral).unwrap().start_location(), 10.0);
        assert_eq!(fx.events(), vec![Started("a"), Started("b")]);
    }

    #[test]
    fn test_abort_swallows_stop_failure() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::default();

        let mut stuck = fx.recorder("lat", Lateral, 0.0, 10.0);
        stuck.fail_stop = true;

        let mut traj = PlannedTrajectory::new(0.0, 10.0).unwrap();
        traj.add_maneuver(Box::new(stuck)).unwrap();
        traj.add_maneuver(Box::new(fx.recorder("long", Longitudinal, 0.0, 10.0)))
            .unwrap();
        exec.submit(Box::new(traj)).unwrap();
        exec.update_position(1.0).unwrap();

        exec.abort();

        assert!(exec.is_idle());
        assert_eq!(
            fx.events(),
            vec![Started("lat"), Started("long"), Stopped("long")]
        );
        exec.update_position(5.0).unwrap();
    }

    #[test]
    fn test_abort_clears_regression_reference() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::new(TrajExecParams {
            regression_policy: RegressionPolicy::Reject,
            regression_tolerance_m: 0.0,
        });

        exec.update_position(50.0).unwrap();
        exec.abort();
        exec.submit(fx.traj(0.0, 10.0, &[("a", Lateral, 0.0, 10.0)]))
            .unwrap();
        assert_eq!(exec.current_maneuver(Lateral).unwrap().start_location(), 0.0);

        exec.update_position(0.0).unwrap();
        exec.update_position(5.0).unwrap();
        assert!(exec.current_maneuver(Lateral).unwrap().is_running());

        exec.update_position(10.0).unwrap();
        assert!(exec.is_idle());
        assert_eq!(fx.events(), vec![Started("a"), Stopped("a")]);

        // Regressions are still rejected once a new reference exists
        assert!(matches!(
            exec.update_position(2.0),
            Err(TrajExecError::DistanceRegression { previous_m, .. }) if previous_m == 10.0
        ));
    }

    #[test]
    fn test_non_finite_distance_rejected() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::new(TrajExecParams {
            regression_policy: RegressionPolicy::Reject,
            regression_tolerance_m: 0.0,
        });

        assert!(matches!(
            exec.update_position(std::f64::NAN),
            Err(TrajExecError::NonFiniteDistance(_))
        ));
        assert!(matches!(
            exec.update_position(std::f64::INFINITY),
            Err(TrajExecError::NonFiniteDistance(_))
        ));
        assert_eq!(exec.downtrack_distance(), 0.0);

        exec.submit(fx.traj(0.0, 10.0, &[("a", Lateral, 0.0, 10.0)]))
            .unwrap();
        exec.update_position(1.0).unwrap();
        assert!(matches!(
            exec.update_position(std::f64::NAN),
            Err(TrajExecError::NonFiniteDistance(_))
        ));
        assert_eq!(exec.downtrack_distance(), 1.0);

        exec.update_position(2.0).unwrap();
        assert_eq!(fx.events(), vec![Started("a")]);
    }

    #[test]
    fn test_next_maneuver() {
        let fx = Fixture::default();
        let mut exec = TrajExecutor::default();

        assert!(exec.next_maneuver(Lateral).is_none());

        exec.submit(fx.traj(
            0.0,
            30.0,
            &[("a", Lateral, 0.0, 10.0), ("b", Lateral, 10.0, 30.0)],
        ))
        .unwrap();
        exec.update_position(4.0).unwrap();

        assert_eq!(exec.next_maneuver(Lateral).unwrap().start_location(), 10.0);
        assert!(exec.next_maneuver(Longitudinal).is_none());

        // A gap between maneuvers leaves the axis inactive
        let fx = Fixture::default();
        let mut exec = TrajExecutor::default();
        exec.submit(fx.traj(
            0.0,
            30.0,
            &[("a", Lateral, 0.0, 10.0), ("b", Lateral, 20.0, 30.0)],
        ))
        .unwrap();
        exec.update_position(12.0).unwrap();
        assert!(exec.is_idle());
        assert_eq!(fx.events(), vec![Started("a"), Stopped("a")]);
    }
}
