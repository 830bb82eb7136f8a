// src/programs.rs
//! ROBD2 training programs and the device command strings that describe them.
//!
//! The simulator never transmits these; the dashboard renders them and
//! records them in the debug log.
use std::fmt;

use crate::service::DashboardError;

/// Highest step number the device accepts.
pub const MAX_STEP_NUMBER: u32 = 98;
/// Highest target altitude for the standard profile template.
pub const TEMPLATE_MAX_ALTITUDE_FT: u32 = 34000;
pub const TEMPLATE_RATE_FT_MIN: u32 = 3000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepMode {
    /// Hold altitude, value in minutes.
    Hold,
    /// Change altitude, value in ft/min.
    Change,
    End,
}

impl fmt::Display for StepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            StepMode::Hold => "HLD",
            StepMode::Change => "CHG",
            StepMode::End => "END",
        };
        f.write_str(code)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProgramStep {
    pub number: u32,
    pub mode: StepMode,
    pub altitude_ft: u32,
    pub value: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainingProgram {
    pub number: u32,
    pub name: String,
    pub steps: Vec<ProgramStep>,
}

impl TrainingProgram {
    pub fn new(number: u32, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Hold at ground 1 min, climb, hold 5 min, descend, end.
    pub fn altitude_template(number: u32, altitude_ft: u32) -> Result<Self, DashboardError> {
        if altitude_ft > TEMPLATE_MAX_ALTITUDE_FT {
            return Err(DashboardError::TemplateAltitude(altitude_ft));
        }
        let mut program = Self::new(number, format!("{altitude_ft} FT"));
        program.add_step(StepMode::Hold, 0, 1)?;
        program.add_step(StepMode::Change, altitude_ft, TEMPLATE_RATE_FT_MIN)?;
        program.add_step(StepMode::Hold, altitude_ft, 5)?;
        program.add_step(StepMode::Change, 0, TEMPLATE_RATE_FT_MIN)?;
        program.add_step(StepMode::End, 0, 0)?;
        Ok(program)
    }

    pub fn next_step_number(&self) -> u32 {
        self.steps.last().map(|s| s.number + 1).unwrap_or(1)
    }

    pub fn add_step(
        &mut self,
        mode: StepMode,
        altitude_ft: u32,
        value: u32,
    ) -> Result<&ProgramStep, DashboardError> {
        let number = self.next_step_number();
        if number > MAX_STEP_NUMBER {
            return Err(DashboardError::TooManySteps(MAX_STEP_NUMBER));
        }
        self.steps.push(ProgramStep {
            number,
            mode,
            altitude_ft,
            value,
        });
        Ok(&self.steps[self.steps.len() - 1])
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.steps.last(), Some(step) if step.mode == StepMode::End)
    }

    /// Appends an END step unless the program already ends with one.
    pub fn ensure_end(&mut self) -> Result<(), DashboardError> {
        if !self.is_terminated() {
            self.add_step(StepMode::End, 0, 0)?;
        }
        Ok(())
    }

    pub fn name_command(&self) -> String {
        let name = if self.name.trim().is_empty() {
            "PROGRAM"
        } else {
            self.name.trim()
        };
        format!("PROG {} NAME {}", self.number, name)
    }

    pub fn step_command(&self, step: &ProgramStep) -> String {
        match step.mode {
            StepMode::End => format!("PROG {} {} END", self.number, step.number),
            mode => format!(
                "PROG {} {} {} {} {}",
                self.number, step.number, mode, step.altitude_ft, step.value
            ),
        }
    }

    /// Name command followed by one command per step.
    pub fn commands(&self) -> Vec<String> {
        std::iter::once(self.name_command())
            .chain(self.steps.iter().map(|s| self.step_command(s)))
            .collect()
    }

    /// Hold minutes plus climb/descent time, starting from the ground.
    pub fn total_duration_min(&self) -> f64 {
        let mut altitude = 0.0_f64;
        let mut minutes = 0.0;
        for step in &self.steps {
            match step.mode {
                StepMode::Hold => minutes += step.value as f64,
                StepMode::Change => {
                    let target = step.altitude_ft as f64;
                    if step.value > 0 {
                        minutes += (target - altitude).abs() / step.value as f64;
                    }
                    altitude = target;
                }
                StepMode::End => break,
            }
        }
        minutes
    }
}

pub fn flight_sim_command() -> &'static str {
    "RUN FLSIM"
}

pub fn o2_dump_command(on: bool) -> String {
    format!("SET O2DUMP {}", u8::from(on))
}

pub fn flight_sim_altitude_command(altitude_ft: u32) -> String {
    format!("SET FSALT {altitude_ft}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_commands() {
        let program = TrainingProgram::altitude_template(2, 25000).unwrap();
        assert_eq!(
            program.commands(),
            vec![
                "PROG 2 NAME 25000 FT",
                "PROG 2 1 HLD 0 1",
                "PROG 2 2 CHG 25000 3000",
                "PROG 2 3 HLD 25000 5",
                "PROG 2 4 CHG 0 3000",
                "PROG 2 5 END",
            ]
        );
        assert!(program.is_terminated());
    }

    #[test]
    fn template_rejects_high_altitude() {
        assert!(matches!(
            TrainingProgram::altitude_template(1, 35000),
            Err(DashboardError::TemplateAltitude(35000))
        ));
    }

    #[test]
    fn blank_name_falls_back() {
        let program = TrainingProgram::new(3, "  ");
        assert_eq!(program.name_command(), "PROG 3 NAME PROGRAM");
    }

    #[test]
    fn duration_counts_holds_and_transits() {
        let program = TrainingProgram::altitude_template(1, 15000).unwrap();
        // 1 + 5 + 15000/3000 * 2
        assert_eq!(program.total_duration_min(), 16.0);
    }

    #[test]
    fn ensure_end_and_step_limit() {
        let mut program = TrainingProgram::new(1, "LIMIT");
        program.add_step(StepMode::Hold, 0, 1).unwrap();
        program.ensure_end().unwrap();
        program.ensure_end().unwrap();
        assert_eq!(program.steps.len(), 2);

        let mut full = TrainingProgram::new(1, "FULL");
        for _ in 0..MAX_STEP_NUMBER {
            full.add_step(StepMode::Hold, 0, 1).unwrap();
        }
        assert!(matches!(
            full.ensure_end(),
            Err(DashboardError::TooManySteps(_))
        ));
    }

    #[test]
    fn flight_sim_commands() {
        assert_eq!(flight_sim_command(), "RUN FLSIM");
        assert_eq!(o2_dump_command(true), "SET O2DUMP 1");
        assert_eq!(o2_dump_command(false), "SET O2DUMP 0");
        assert_eq!(flight_sim_altitude_command(10000), "SET FSALT 10000");
    }
}
