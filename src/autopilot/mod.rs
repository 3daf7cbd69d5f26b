//! PID-based autopilot: hold modes plus an automated takeoff roll.
//!
//! The autopilot is a pure bus participant. It observes `PositionUpdated`
//! snapshots, reacts to `AutopilotCommand` messages, and emits validated
//! control inputs once per tick while engaged.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::bus::{AutopilotCommandMsg, ControlInputMsg, PositionUpdatedMsg};
use crate::config::{AutopilotConfig, PidGains};
use crate::utils::constants::{FT_TO_M, KNOTS_TO_MPS, MPS_TO_FPM};
use crate::utils::math::heading_error_deg;

/// Simple PID controller with integral anti-windup.
#[derive(Debug, Clone)]
pub struct Pid {
    kp: f64,
    ki: f64,
    kd: f64,
    integral: f64,
    last_error: f64,
    output_min: f64,
    output_max: f64,
}

impl Pid {
    pub fn new(gains: PidGains, output_min: f64, output_max: f64) -> Self {
        Self {
            kp: gains.kp,
            ki: gains.ki,
            kd: gains.kd,
            integral: 0.0,
            last_error: 0.0,
            output_min,
            output_max,
        }
    }

    pub fn update(&mut self, error: f64, dt: f64) -> f64 {
        let p = self.kp * error;

        self.integral += error * dt;
        // Anti-windup: keep the integral term within what can appear at
        // the output.
        let (i_min, i_max) = if self.ki > 0.0 {
            (self.output_min / self.ki, self.output_max / self.ki)
        } else {
            (-1.0, 1.0)
        };
        self.integral = self.integral.clamp(i_min, i_max);
        let i = self.ki * self.integral;

        let d = if dt > 0.0 {
            self.kd * (error - self.last_error) / dt
        } else {
            0.0
        };
        self.last_error = error;

        (p + i + d).clamp(self.output_min, self.output_max)
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutopilotMode {
    Off,
    GroundTakeoff,
    HeadingHold,
    AltitudeHold,
    VerticalSpeed,
    SpeedHold,
}

#[derive(Debug)]
pub struct Autopilot {
    config: AutopilotConfig,
    mode: AutopilotMode,
    engaged: bool,

    target_heading_deg: f64,
    target_altitude_ft: f64,
    target_vs_fpm: f64,
    target_speed_kts: f64,

    // Last observed flight state, derived from PositionUpdated.
    altitude_ft: f64,
    heading_deg: f64,
    vs_fpm: f64,
    speed_kts: f64,
    pitch_deg: f64,
    on_ground: bool,

    heading_pid: Pid,
    altitude_pid: Pid,
    speed_pid: Pid,
    vs_pid: Pid,
}

impl Autopilot {
    pub fn new(config: AutopilotConfig) -> Self {
        Self {
            heading_pid: Pid::new(config.heading, -1.0, 1.0),
            altitude_pid: Pid::new(config.altitude, -0.5, 0.5),
            speed_pid: Pid::new(config.speed, 0.0, 1.0),
            vs_pid: Pid::new(config.vertical_speed, -0.3, 0.3),
            config,
            mode: AutopilotMode::Off,
            engaged: false,
            target_heading_deg: 0.0,
            target_altitude_ft: 0.0,
            target_vs_fpm: 0.0,
            target_speed_kts: 80.0,
            altitude_ft: 0.0,
            heading_deg: 0.0,
            vs_fpm: 0.0,
            speed_kts: 0.0,
            pitch_deg: 0.0,
            on_ground: true,
        }
    }

    pub fn mode(&self) -> AutopilotMode {
        self.mode
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Ingest the latest flight state snapshot.
    pub fn observe(&mut self, position: &PositionUpdatedMsg) {
        self.altitude_ft = position.position.y / FT_TO_M;
        self.heading_deg = position.rotation.z.to_degrees().rem_euclid(360.0);
        self.vs_fpm = position.velocity.y * MPS_TO_FPM;
        self.speed_kts = position.airspeed / KNOTS_TO_MPS;
        self.pitch_deg = position.rotation.x.to_degrees();
        self.on_ground = position.on_ground;
    }

    pub fn handle_command(&mut self, command: &AutopilotCommandMsg) {
        match *command {
            AutopilotCommandMsg::Engage(mode) => self.engage(mode),
            AutopilotCommandMsg::Disengage => self.disengage(),
            AutopilotCommandMsg::SetHeading(heading) => {
                self.target_heading_deg = heading.rem_euclid(360.0);
                info!(heading = self.target_heading_deg, "autopilot heading target set");
            }
            AutopilotCommandMsg::SetAltitude(altitude_ft) => {
                self.target_altitude_ft = altitude_ft;
                info!(altitude_ft, "autopilot altitude target set");
            }
            AutopilotCommandMsg::SetSpeed(speed_kts) => {
                self.target_speed_kts = speed_kts;
                info!(speed_kts, "autopilot speed target set");
            }
            AutopilotCommandMsg::SetVerticalSpeed(vs_fpm) => {
                self.target_vs_fpm = vs_fpm;
                if self.mode != AutopilotMode::VerticalSpeed {
                    self.engage(AutopilotMode::VerticalSpeed);
                }
                info!(vs_fpm, "autopilot vertical speed target set");
            }
        }
    }

    pub fn engage(&mut self, mode: AutopilotMode) {
        if mode == AutopilotMode::Off {
            error!("cannot engage the off mode, use disengage");
            return;
        }
        self.mode = mode;
        self.engaged = true;

        // Capture current state as the initial target.
        match mode {
            AutopilotMode::HeadingHold => self.target_heading_deg = self.heading_deg,
            AutopilotMode::AltitudeHold => self.target_altitude_ft = self.altitude_ft,
            AutopilotMode::SpeedHold => self.target_speed_kts = self.speed_kts,
            _ => {}
        }

        self.heading_pid.reset();
        self.altitude_pid.reset();
        self.speed_pid.reset();
        self.vs_pid.reset();

        info!(?mode, "autopilot engaged");
    }

    pub fn disengage(&mut self) {
        self.engaged = false;
        self.mode = AutopilotMode::Off;
        info!("autopilot disengaged");
    }

    /// Produce control inputs for this tick, or `None` when disengaged.
    pub fn update(&mut self, dt: f64) -> Option<ControlInputMsg> {
        if !self.engaged || self.mode == AutopilotMode::Off {
            return None;
        }

        let controls = match self.mode {
            AutopilotMode::GroundTakeoff => self.update_ground_takeoff(),
            AutopilotMode::HeadingHold => self.update_heading_hold(dt),
            AutopilotMode::AltitudeHold => self.update_altitude_hold(dt),
            AutopilotMode::VerticalSpeed => self.update_vertical_speed(dt),
            AutopilotMode::SpeedHold => self.update_speed_hold(dt),
            AutopilotMode::Off => return None,
        };

        Some(ControlInputMsg {
            pitch: controls.pitch.clamp(-1.0, 1.0),
            roll: controls.roll.clamp(-1.0, 1.0),
            yaw: controls.yaw.clamp(-1.0, 1.0),
            throttle: controls.throttle.clamp(0.0, 1.0),
            ..controls
        })
    }

    fn update_ground_takeoff(&mut self) -> ControlInputMsg {
        let mut controls = ControlInputMsg {
            throttle: 1.0,
            ..Default::default()
        };

        if self.on_ground && self.speed_kts >= self.config.rotation_speed_kts {
            // Rotation speed reached, gentle back pressure.
            controls.pitch = 0.15;
        } else if !self.on_ground {
            let pitch_error = self.config.climb_pitch_deg - self.pitch_deg;
            controls.pitch = (pitch_error * 0.02).clamp(-0.3, 0.3);

            if self.altitude_ft > self.config.takeoff_handoff_ft {
                self.mode = AutopilotMode::AltitudeHold;
                self.target_altitude_ft = 1500.0;
                info!("takeoff complete, switching to altitude hold");
            }
        }

        controls
    }

    fn update_heading_hold(&mut self, dt: f64) -> ControlInputMsg {
        let error = heading_error_deg(self.target_heading_deg, self.heading_deg);
        ControlInputMsg {
            roll: self.heading_pid.update(error, dt),
            throttle: 0.5,
            ..Default::default()
        }
    }

    fn update_altitude_hold(&mut self, dt: f64) -> ControlInputMsg {
        let altitude_error = self.target_altitude_ft - self.altitude_ft;
        let heading_error = heading_error_deg(self.target_heading_deg, self.heading_deg);
        let speed_error = self.target_speed_kts - self.speed_kts;

        ControlInputMsg {
            pitch: self.altitude_pid.update(altitude_error, dt),
            roll: self.heading_pid.update(heading_error, dt),
            throttle: self.speed_pid.update(speed_error, dt),
            ..Default::default()
        }
    }

    fn update_vertical_speed(&mut self, dt: f64) -> ControlInputMsg {
        let vs_error = self.target_vs_fpm - self.vs_fpm;
        let heading_error = heading_error_deg(self.target_heading_deg, self.heading_deg);
        let speed_error = self.target_speed_kts - self.speed_kts;

        ControlInputMsg {
            pitch: self.vs_pid.update(vs_error, dt),
            roll: self.heading_pid.update(heading_error, dt),
            throttle: self.speed_pid.update(speed_error, dt),
            ..Default::default()
        }
    }

    fn update_speed_hold(&mut self, dt: f64) -> ControlInputMsg {
        let speed_error = self.target_speed_kts - self.speed_kts;
        ControlInputMsg {
            throttle: self.speed_pid.update(speed_error, dt),
            ..Default::default()
        }
    }
}
