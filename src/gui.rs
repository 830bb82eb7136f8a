// src/gui.rs
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use eframe::egui;
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Line, Plot, PlotPoints};
use log::warn;

use crate::calibration::CalibrationData;
use crate::config::DashboardConfig;
use crate::debug_log::{DebugLog, EntryKind};
use crate::diagnostics::{
    adc_command, mfc_command, resolve_command, DiagnosticsConsole, ADC_CHANNELS, MFC_CHANNELS,
    QUICK_COMMANDS,
};
use crate::gas::{
    cylinder_capacity, gas_consumption, single_session, GasConsumptionInput, GasPrices,
};
use crate::limits::{altitude_alert, pulse_alert, spo2_alert, AlertLevel};
use crate::physiology::physiological_params;
use crate::programs::{
    flight_sim_altitude_command, flight_sim_command, o2_dump_command, StepMode, TrainingProgram,
};
use crate::recorder;
use crate::service::stats::{Histogram, Quartiles, O2_HISTOGRAM_BINS, SPO2_HISTOGRAM_BINS};
use crate::service::{lock_service, shared, DataService, PollingController};
use crate::types::{LiveSample, SampleField};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Page {
    Dashboard,
    Connection,
    Calibration,
    GasCalculators,
    Programs,
    Logging,
    Performance,
    Diagnostics,
}

impl Page {
    const ALL: [Page; 8] = [
        Page::Dashboard,
        Page::Connection,
        Page::Calibration,
        Page::GasCalculators,
        Page::Programs,
        Page::Logging,
        Page::Performance,
        Page::Diagnostics,
    ];

    fn label(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Connection => "Connection",
            Page::Calibration => "Calibration",
            Page::GasCalculators => "Gas Calculators",
            Page::Programs => "Programs",
            Page::Logging => "Logging",
            Page::Performance => "Performance",
            Page::Diagnostics => "Diagnostics",
        }
    }
}

// 仪表盘图表: 字段 + 颜色
const CHARTS: [(SampleField, Color32); 5] = [
    (SampleField::Altitude, Color32::from_rgb(0, 200, 255)),
    (SampleField::O2Conc, Color32::from_rgb(0, 230, 120)),
    (SampleField::Spo2, Color32::from_rgb(255, 200, 0)),
    (SampleField::Pulse, Color32::from_rgb(255, 80, 120)),
    (SampleField::Blp, Color32::from_rgb(180, 120, 255)),
];

fn alert_color(level: AlertLevel) -> Color32 {
    match level {
        AlertLevel::Normal => Color32::from_rgb(0, 230, 120),
        AlertLevel::Warning => Color32::YELLOW,
        AlertLevel::Critical => Color32::RED,
    }
}

pub struct Robd2App {
    config: DashboardConfig,
    polling: PollingController,
    rx: Receiver<LiveSample>,
    page: Page,

    // 连接
    port: String,
    latest: Option<LiveSample>,

    // 校准 / 日志 / 程序
    calibration: CalibrationData,
    debug_log: DebugLog,
    program: TrainingProgram,
    step_mode: StepMode,
    step_altitude: u32,
    step_value: u32,
    template_altitude: u32,
    fs_altitude: u32,

    // 计算器输入
    calc_altitude: f64,
    gas_input: GasConsumptionInput,
    cylinders_m3: [f64; 3],

    // 诊断
    console: DiagnosticsConsole,
    quick_command: &'static str,
    custom_command: String,
    mfc_channel: u8,
    adc_channel: u8,

    export_filename: String,
    log_messages: Vec<String>,
}

impl Robd2App {
    pub fn new(config: DashboardConfig) -> Self {
        let (tx, rx) = channel();
        let mut service = DataService::new(config.buffer_capacity);
        // 新样本转发给界面线程
        service.subscribe(Box::new(move |sample: &LiveSample| {
            tx.send(sample.clone()).ok();
        }));
        let polling = PollingController::new(shared(service));

        Self {
            port: config.default_port.clone(),
            config,
            polling,
            rx,
            page: Page::Dashboard,
            latest: None,
            calibration: CalibrationData::default(),
            debug_log: DebugLog::new(),
            program: TrainingProgram::new(1, "PROGRAM"),
            step_mode: StepMode::Hold,
            step_altitude: 0,
            step_value: 1,
            template_altitude: 25000,
            fs_altitude: 10000,
            calc_altitude: 25000.0,
            gas_input: GasConsumptionInput {
                students_per_week: 10,
                weeks: 4,
                session_duration_min: 30.0,
                recovery_duration_min: 10.0,
                altitude_ft: 25000.0,
                prices: GasPrices {
                    air: 10.0,
                    nitrogen: 15.0,
                    oxygen: 20.0,
                },
                contingency: 0.1,
            },
            cylinders_m3: [10.0, 10.0, 10.0],
            console: DiagnosticsConsole::new(),
            quick_command: QUICK_COMMANDS[0],
            custom_command: String::new(),
            mfc_channel: 1,
            adc_channel: 12,
            export_filename: recorder::flight_filename(Local::now().naive_local()),
            log_messages: vec!["ROBD2 dashboard ready (demo mode).".to_owned()],
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > 8 {
            self.log_messages.remove(0);
        }
    }

    fn is_connected(&self) -> bool {
        lock_service(self.polling.service()).is_connected()
    }

    fn connect(&mut self) {
        let result = lock_service(self.polling.service()).connect(&self.port);
        self.debug_log.push(EntryKind::Event, result.message.clone());
        self.log(&result.message);
        if result.success {
            if let Err(err) = self.polling.start(self.config.poll_interval()) {
                self.debug_log.push(EntryKind::Error, err.to_string());
                self.log(&err.to_string());
            }
        }
    }

    fn disconnect(&mut self) {
        self.polling.stop();
        let result = lock_service(self.polling.service()).disconnect();
        self.debug_log.push(EntryKind::Event, result.message.clone());
        self.log(&result.message);
    }

    fn clear_data(&mut self) {
        lock_service(self.polling.service()).clear_data();
        self.latest = None;
        self.log("Data cleared");
    }

    fn send_command(&mut self, command: String) {
        self.debug_log.push(EntryKind::Command, command.clone());
        self.log(&format!("Command: {}", command));
    }

    fn save_flight_csv(&self) -> Result<PathBuf> {
        let csv = lock_service(self.polling.service()).export_csv();
        recorder::save_text(&self.config.export_dir, &self.export_filename, &csv)
            .with_context(|| format!("saving {}", self.export_filename))
    }

    fn save_debug_log(&self) -> Result<PathBuf> {
        let name = recorder::debug_log_filename(Utc::now());
        recorder::save_text(&self.config.export_dir, &name, &self.debug_log.export())
            .with_context(|| format!("saving {}", name))
    }

    fn save_calibration(&self) -> Result<PathBuf> {
        recorder::save_text(&self.config.export_dir, "calibration.csv", &self.calibration.to_csv())
            .context("saving calibration.csv")
    }

    fn report(&mut self, what: &str, outcome: Result<PathBuf>) {
        match outcome {
            Ok(path) => self.log(&format!("{}: {}", what, path.display())),
            Err(err) => {
                warn!("{err:#}");
                self.debug_log.push(EntryKind::Error, format!("{err:#}"));
                self.log(&format!("Error: {err:#}"));
            }
        }
    }

    // ---- pages ----

    fn metric_card(ui: &mut egui::Ui, title: &str, value: String, level: AlertLevel) {
        ui.group(|ui| {
            ui.vertical(|ui| {
                ui.label(RichText::new(title).small());
                ui.label(RichText::new(value).size(22.0).color(alert_color(level)));
            });
        });
    }

    fn dashboard_page(&mut self, ui: &mut egui::Ui) {
        ui.heading("Live Monitoring");
        match &self.latest {
            Some(s) => {
                ui.horizontal(|ui| {
                    Self::metric_card(ui, "Altitude", format!("{:.0} ft", s.altitude), altitude_alert(s.altitude));
                    Self::metric_card(ui, "O2", format!("{:.2} %", s.o2_conc), AlertLevel::Normal);
                    Self::metric_card(ui, "SpO2", format!("{:.1} %", s.spo2), spo2_alert(s.spo2));
                    Self::metric_card(ui, "Pulse", format!("{:.0} bpm", s.pulse), pulse_alert(s.pulse));
                    Self::metric_card(ui, "BLP", format!("{:.2} mmHg", s.blp), AlertLevel::Normal);
                });
            }
            None => {
                ui.label("No samples yet. Connect on the Connection page.");
            }
        }
        let (count, capacity) = {
            let svc = lock_service(self.polling.service());
            (svc.sample_count(), svc.buffer_capacity())
        };
        ui.add(
            egui::ProgressBar::new(count as f32 / capacity as f32)
                .text(format!("Buffer {} / {}", count, capacity)),
        );
        ui.separator();

        let series: Vec<_> = {
            let svc = lock_service(self.polling.service());
            CHARTS
                .iter()
                .map(|(field, color)| {
                    let points: Vec<[f64; 2]> = svc
                        .time_series(*field)
                        .iter()
                        .map(|p| [p.time, p.value])
                        .collect();
                    (*field, *color, points)
                })
                .collect()
        };
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (field, color, points) in series {
                ui.label(field.label());
                Plot::new(field.label())
                    .height(140.0)
                    .allow_scroll(false)
                    .show(ui, |plot_ui| {
                        plot_ui.line(Line::new(PlotPoints::new(points)).name(field.label()).color(color));
                    });
            }
        });
    }

    fn connection_page(&mut self, ui: &mut egui::Ui) {
        ui.heading("Connection");
        let (ports, status) = {
            let svc = lock_service(self.polling.service());
            (svc.available_ports(), svc.connection_status(self.polling.is_running()))
        };
        egui::ComboBox::from_label("Port")
            .selected_text(self.port.clone())
            .show_ui(ui, |ui| {
                for p in &ports {
                    ui.selectable_value(&mut self.port, p.clone(), p.as_str());
                }
            });
        ui.horizontal(|ui| {
            if status.connected {
                if ui.button("Disconnect").clicked() {
                    self.disconnect();
                }
            } else if ui.button("Connect").clicked() {
                self.connect();
            }
        });
        ui.separator();
        let fmt_age = |age: Option<f64>| age.map(|a| format!("{:.1} s", a)).unwrap_or_else(|| "-".into());
        egui::Grid::new("connection_status").num_columns(2).striped(true).show(ui, |ui| {
            ui.label("Connected");
            ui.label(if status.connected { "yes" } else { "no" });
            ui.end_row();
            ui.label("Port");
            ui.label(status.port.clone().unwrap_or_else(|| "-".into()));
            ui.end_row();
            ui.label("Polling thread");
            ui.label(if status.thread_alive { "alive" } else { "stopped" });
            ui.end_row();
            ui.label("Poll interval");
            ui.label(format!("{:.1} s", status.poll_interval_sec));
            ui.end_row();
            ui.label("Sample age");
            ui.label(fmt_age(status.sample_age_sec));
            ui.end_row();
            ui.label("Attempt age");
            ui.label(fmt_age(status.attempt_age_sec));
            ui.end_row();
            ui.label("Consecutive errors");
            ui.label(status.consecutive_errors.to_string());
            ui.end_row();
        });
    }

    fn calibration_page(&mut self, ui: &mut egui::Ui) {
        ui.heading("O2 Sensor Calibration");
        let latest = self.latest.clone();
        ui.horizontal(|ui| {
            let enabled = latest.is_some();
            if ui.add_enabled(enabled, egui::Button::new("Record room air")).clicked() {
                if let Some(s) = &latest {
                    self.calibration.record_room_air(s);
                }
            }
            if ui.add_enabled(enabled, egui::Button::new("Record pure O2")).clicked() {
                if let Some(s) = &latest {
                    self.calibration.record_pure_o2(s);
                }
            }
            if ui.button("Clear").clicked() {
                self.calibration.clear();
            }
        });
        egui::Grid::new("calibration").num_columns(3).striped(true).show(ui, |ui| {
            ui.label("Point");
            ui.label("O2 %");
            ui.label("ADC (V)");
            ui.end_row();
            for (name, point) in [("Room air", self.calibration.room_air), ("Pure O2", self.calibration.pure_o2)] {
                ui.label(name);
                match point {
                    Some(p) => {
                        ui.label(format!("{:.2}", p.o2_percent));
                        ui.label(format!("{:.3}", p.adc_equivalent));
                    }
                    None => {
                        ui.label("-");
                        ui.label("-");
                    }
                }
                ui.end_row();
            }
        });
        if self.calibration.is_complete() {
            ui.colored_label(Color32::from_rgb(0, 230, 120), "Calibration complete");
        } else {
            ui.colored_label(Color32::YELLOW, "Record both points to complete calibration");
        }
        if let Some(slope) = self.calibration.slope() {
            ui.label(format!("Slope: {:.2} %/V", slope));
        }
        if ui.button("Save calibration.csv").clicked() {
            let outcome = self.save_calibration();
            self.report("Calibration saved", outcome);
        }
    }

    fn gas_page(&mut self, ui: &mut egui::Ui) {
        ui.heading("Physiology at Altitude");
        ui.add(egui::DragValue::new(&mut self.calc_altitude).speed(100.0).clamp_range(0.0..=35000.0).suffix(" ft"));
        let p = physiological_params(self.calc_altitude);
        egui::Grid::new("physiology").num_columns(2).show(ui, |ui| {
            for (name, value) in [
                ("Altitude (m)", format!("{:.0}", p.altitude_m)),
                ("Pressure (mmHg)", format!("{:.1}", p.pressure_mmhg)),
                ("PAO2 (mmHg)", format!("{:.1}", p.pao2)),
                ("SaO2 (%)", format!("{:.1}", p.sao2)),
                ("Ventilation (L/min)", format!("{:.1}", p.ventilation_rate_l_min)),
                ("Heart rate (bpm)", format!("{:.0}", p.heart_rate_bpm)),
            ] {
                ui.label(name);
                ui.label(value);
                ui.end_row();
            }
        });
        ui.separator();

        ui.heading("Gas Consumption");
        let input = &mut self.gas_input;
        egui::Grid::new("gas_inputs").num_columns(2).show(ui, |ui| {
            ui.label("Students / week");
            ui.add(egui::DragValue::new(&mut input.students_per_week));
            ui.end_row();
            ui.label("Weeks");
            ui.add(egui::DragValue::new(&mut input.weeks));
            ui.end_row();
            ui.label("Session (min)");
            ui.add(egui::DragValue::new(&mut input.session_duration_min).clamp_range(0.0..=240.0));
            ui.end_row();
            ui.label("Recovery (min)");
            ui.add(egui::DragValue::new(&mut input.recovery_duration_min).clamp_range(0.0..=240.0));
            ui.end_row();
            ui.label("Altitude (ft)");
            ui.add(egui::DragValue::new(&mut input.altitude_ft).speed(100.0).clamp_range(0.0..=35000.0));
            ui.end_row();
            ui.label("Price air / N2 / O2");
            ui.horizontal(|ui| {
                ui.add(egui::DragValue::new(&mut input.prices.air).speed(0.1));
                ui.add(egui::DragValue::new(&mut input.prices.nitrogen).speed(0.1));
                ui.add(egui::DragValue::new(&mut input.prices.oxygen).speed(0.1));
            });
            ui.end_row();
            ui.label("Contingency");
            ui.add(egui::DragValue::new(&mut input.contingency).speed(0.01).clamp_range(0.0..=1.0));
            ui.end_row();
        });
        let totals = gas_consumption(&self.gas_input);
        let session = single_session(
            self.gas_input.session_duration_min,
            self.gas_input.recovery_duration_min,
            self.gas_input.altitude_ft,
            self.gas_input.prices,
        );
        ui.label(format!(
            "Per session: air {:.3} m³, N2 {:.4} m³, O2 {:.3} m³, cost {:.2}",
            session.air_consumed_m3, session.nitrogen_consumed_m3, session.oxygen_consumed_m3, session.total_cost
        ));
        ui.label(format!(
            "Program total: air {:.2} m³, N2 {:.3} m³, O2 {:.2} m³",
            totals.total_air_m3, totals.total_nitrogen_m3, totals.total_oxygen_m3
        ));
        ui.label(format!(
            "Cost {:.2} (with contingency {:.2})",
            totals.total_cost, totals.total_cost_with_contingency
        ));
        ui.separator();

        ui.heading("Cylinder Capacity");
        ui.horizontal(|ui| {
            ui.label("Air / N2 / O2 (m³)");
            for v in self.cylinders_m3.iter_mut() {
                ui.add(egui::DragValue::new(v).speed(0.5).clamp_range(0.0..=1000.0));
            }
        });
        let [air, n2, o2] = self.cylinders_m3;
        let cap = cylinder_capacity(
            air,
            n2,
            o2,
            self.gas_input.session_duration_min,
            self.gas_input.recovery_duration_min,
            self.gas_input.altitude_ft,
        );
        ui.label(format!(
            "Students supported: {} (air {}, N2 {}, O2 {})",
            cap.max_students, cap.max_students_air, cap.max_students_nitrogen, cap.max_students_oxygen
        ));
    }

    fn programs_page(&mut self, ui: &mut egui::Ui) {
        ui.heading("Training Programs");
        ui.horizontal(|ui| {
            ui.label("Program #");
            ui.add(egui::DragValue::new(&mut self.program.number).clamp_range(1..=99));
            ui.label("Name");
            ui.text_edit_singleline(&mut self.program.name);
        });
        if ui.button("Save name").clicked() {
            let cmd = self.program.name_command();
            self.send_command(cmd);
        }
        ui.separator();

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.step_mode, StepMode::Hold, "HLD");
            ui.selectable_value(&mut self.step_mode, StepMode::Change, "CHG");
            ui.selectable_value(&mut self.step_mode, StepMode::End, "END");
            ui.label("Alt (ft)");
            ui.add(egui::DragValue::new(&mut self.step_altitude).speed(100.0).clamp_range(0..=35000));
            let unit = if self.step_mode == StepMode::Change { "ft/min" } else { "min" };
            ui.label(unit);
            ui.add(egui::DragValue::new(&mut self.step_value));
        });
        ui.horizontal(|ui| {
            if ui.button("Add step").clicked() {
                match self.program.add_step(self.step_mode, self.step_altitude, self.step_value) {
                    Ok(step) => {
                        let step = step.clone();
                        let cmd = self.program.step_command(&step);
                        self.send_command(cmd);
                    }
                    Err(err) => self.log(&err.to_string()),
                }
            }
            if ui.button("Clear steps").clicked() {
                self.program.steps.clear();
            }
        });
        ui.horizontal(|ui| {
            ui.add(egui::DragValue::new(&mut self.template_altitude).speed(100.0).clamp_range(0..=34000));
            if ui.button("Load altitude template").clicked() {
                match TrainingProgram::altitude_template(self.program.number, self.template_altitude) {
                    Ok(program) => {
                        self.program = program;
                        self.log("Template loaded");
                    }
                    Err(err) => self.log(&err.to_string()),
                }
            }
            if ui.button("Send program").clicked() {
                match self.program.ensure_end() {
                    Ok(()) => {
                        for cmd in self.program.commands() {
                            self.send_command(cmd);
                        }
                    }
                    Err(err) => self.log(&err.to_string()),
                }
            }
        });
        egui::Grid::new("steps").num_columns(4).striped(true).show(ui, |ui| {
            for step in &self.program.steps {
                ui.label(step.number.to_string());
                ui.label(step.mode.to_string());
                ui.label(step.altitude_ft.to_string());
                ui.label(step.value.to_string());
                ui.end_row();
            }
        });
        ui.label(format!("Duration: {:.1} min", self.program.total_duration_min()));
        ui.separator();

        ui.heading("Flight Simulation");
        ui.horizontal(|ui| {
            if ui.button("RUN FLSIM").clicked() {
                self.send_command(flight_sim_command().to_owned());
            }
            if ui.button("O2 dump on").clicked() {
                self.send_command(o2_dump_command(true));
            }
            if ui.button("O2 dump off").clicked() {
                self.send_command(o2_dump_command(false));
            }
        });
        ui.horizontal(|ui| {
            ui.add(egui::DragValue::new(&mut self.fs_altitude).speed(100.0).clamp_range(0..=35000));
            if ui.button("Set FS altitude").clicked() {
                self.send_command(flight_sim_altitude_command(self.fs_altitude));
            }
        });
    }

    fn logging_page(&mut self, ui: &mut egui::Ui) {
        ui.heading("Export");
        ui.horizontal(|ui| {
            ui.label("Filename");
            ui.text_edit_singleline(&mut self.export_filename);
        });
        if ui.button("Save buffer to CSV").clicked() {
            let outcome = self.save_flight_csv();
            self.report("Saved", outcome);
        }
        ui.separator();

        ui.heading("Debug Log");
        ui.horizontal(|ui| {
            if ui.button("Add marker").clicked() {
                self.debug_log.add_marker();
            }
            if ui.button("Save debug log").clicked() {
                let outcome = self.save_debug_log();
                self.report("Debug log saved", outcome);
            }
            if ui.button("Clear").clicked() {
                self.debug_log.clear();
            }
        });
        egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
            if self.debug_log.is_empty() {
                ui.label("(empty)");
            }
            for entry in self.debug_log.entries() {
                ui.monospace(entry.render());
            }
        });
    }

    fn histogram_plot(ui: &mut egui::Ui, id: &str, hist: &Histogram, color: Color32) {
        let bars: Vec<Bar> = hist
            .counts
            .iter()
            .enumerate()
            .map(|(i, count)| Bar::new(hist.bin_center(i), *count as f64).width(hist.bin_width * 0.9))
            .collect();
        Plot::new(id).height(160.0).allow_scroll(false).show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(color).name(id));
        });
    }

    fn performance_page(&mut self, ui: &mut egui::Ui) {
        ui.heading("Performance");
        let (stats, o2_hist, spo2_hist, o2_box, spo2_box, capacity) = {
            let svc = lock_service(self.polling.service());
            (
                svc.performance_stats(),
                svc.histogram(SampleField::O2Conc, O2_HISTOGRAM_BINS),
                svc.histogram(SampleField::Spo2, SPO2_HISTOGRAM_BINS),
                svc.box_plot(SampleField::O2Conc),
                svc.box_plot(SampleField::Spo2),
                svc.buffer_capacity(),
            )
        };
        let Some(stats) = stats else {
            ui.label("Need at least 2 samples.");
            return;
        };
        ui.label(format!("Samples: {} / {}", stats.samples, capacity));
        egui::Grid::new("stats").num_columns(3).striped(true).show(ui, |ui| {
            ui.label("");
            ui.label("O2 (%)");
            ui.label("SpO2 (%)");
            ui.end_row();
            let rows = [
                ("Mean", stats.o2.mean, stats.spo2.mean),
                ("Std dev", stats.o2.std_dev, stats.spo2.std_dev),
                ("CV (%)", stats.o2.cv_percent, stats.spo2.cv_percent),
                ("Min", stats.o2.min, stats.spo2.min),
                ("Max", stats.o2.max, stats.spo2.max),
            ];
            for (name, o2, spo2) in rows {
                ui.label(name);
                ui.label(format!("{:.2}", o2));
                ui.label(format!("{:.2}", spo2));
                ui.end_row();
            }
        });

        let quality = stats.quality();
        let good = Color32::from_rgb(0, 230, 120);
        ui.separator();
        ui.heading("Quality Assessment");
        if quality.consistent {
            ui.colored_label(good, "Excellent consistency (CV < 5%)");
        } else {
            ui.colored_label(Color32::YELLOW, "High variability detected");
        }
        if quality.adequate_samples {
            ui.colored_label(good, "Adequate sample size for analysis");
        } else {
            ui.colored_label(Color32::YELLOW, "Consider collecting more samples");
        }
        if ui.button("Clear data").clicked() {
            self.clear_data();
        }
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            if let Some(h) = &o2_hist {
                ui.label("O2 Concentration Distribution");
                Self::histogram_plot(ui, "O2 %", h, CHARTS[1].1);
            }
            if let Some(h) = &spo2_hist {
                ui.label("SpO2 Distribution");
                Self::histogram_plot(ui, "SpO2 %", h, CHARTS[2].1);
            }
            if let (Some(o2), Some(spo2)) = (o2_box, spo2_box) {
                ui.label("Parameter Distribution (Box Plot)");
                let elem = |x: f64, name: &str, q: Quartiles| {
                    BoxElem::new(x, BoxSpread::new(q.min, q.q1, q.median, q.q3, q.max))
                        .name(name)
                        .box_width(0.5)
                };
                Plot::new("box_plot").height(200.0).allow_scroll(false).show(ui, |plot_ui| {
                    plot_ui.box_plot(BoxPlot::new(vec![elem(0.0, "O2 %", o2)]).color(CHARTS[1].1).name("O2 %"));
                    plot_ui.box_plot(BoxPlot::new(vec![elem(1.0, "SpO2 %", spo2)]).color(CHARTS[2].1).name("SpO2 %"));
                });
                egui::Grid::new("quartiles").num_columns(6).striped(true).show(ui, |ui| {
                    for h in ["", "Min", "Q1", "Median", "Q3", "Max"] {
                        ui.label(h);
                    }
                    ui.end_row();
                    for (name, q) in [("O2 %", o2), ("SpO2 %", spo2)] {
                        ui.label(name);
                        for v in [q.min, q.q1, q.median, q.q3, q.max] {
                            ui.label(format!("{:.2}", v));
                        }
                        ui.end_row();
                    }
                });
            }
        });
    }

    fn query(&mut self, command: String) {
        let record = self.console.send(&command);
        let line = format!("{} -> {}", record.command, record.response);
        self.debug_log.push(EntryKind::Command, line);
        self.log(&format!("Command: {}", command));
    }

    fn diagnostics_page(&mut self, ui: &mut egui::Ui) {
        ui.heading("Diagnostics");
        egui::ComboBox::from_label("Quick command")
            .selected_text(self.quick_command)
            .show_ui(ui, |ui| {
                for cmd in QUICK_COMMANDS {
                    ui.selectable_value(&mut self.quick_command, cmd, cmd);
                }
            });
        ui.horizontal(|ui| {
            ui.label("Custom command");
            ui.text_edit_singleline(&mut self.custom_command);
        });
        ui.horizontal(|ui| {
            ui.label("MFC #");
            ui.add(egui::DragValue::new(&mut self.mfc_channel).clamp_range(MFC_CHANNELS));
            ui.label("ADC #");
            ui.add(egui::DragValue::new(&mut self.adc_channel).clamp_range(ADC_CHANNELS));
        });
        ui.horizontal(|ui| {
            if ui.button("Send").clicked() {
                let cmd = resolve_command(&self.custom_command, self.quick_command).to_owned();
                self.custom_command.clear();
                self.query(cmd);
            }
            if ui.button("Get MFC flow").clicked() {
                self.query(mfc_command(self.mfc_channel));
            }
            if ui.button("Get ADC voltage").clicked() {
                self.query(adc_command(self.adc_channel));
            }
        });
        ui.separator();
        ui.heading("Command History");
        egui::ScrollArea::vertical().max_height(400.0).show(ui, |ui| {
            if self.console.is_empty() {
                ui.label("No commands sent yet");
            }
            for record in self.console.history() {
                ui.horizontal(|ui| {
                    ui.monospace(RichText::new(&record.command).color(Color32::LIGHT_BLUE));
                    ui.label(record.sent_at.with_timezone(&Local).format("%H:%M:%S").to_string());
                });
                ui.monospace(RichText::new(&record.response).color(Color32::from_rgb(0, 230, 120)));
                ui.add_space(4.0);
            }
        });
    }
}

impl eframe::App for Robd2App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. 消息处理
        while let Ok(sample) = self.rx.try_recv() {
            self.latest = Some(sample);
        }
        if self.polling.is_running() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        // 2. UI 绘制
        ctx.set_visuals(egui::Visuals::dark());

        egui::SidePanel::left("nav").min_width(200.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("ROBD2 Dashboard");
            ui.label("Demo mode");
            ui.separator();
            for page in Page::ALL {
                ui.selectable_value(&mut self.page, page, page.label());
            }
            ui.separator();
            let connected = self.is_connected();
            let (txt, col) = if connected {
                ("CONNECTED", Color32::from_rgb(0, 230, 120))
            } else {
                ("DISCONNECTED", Color32::GRAY)
            };
            ui.label(RichText::new(txt).color(col).strong());
            ui.add_space(10.0);
            egui::ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
                for m in &self.log_messages {
                    ui.monospace(m);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.page {
            Page::Dashboard => self.dashboard_page(ui),
            Page::Connection => self.connection_page(ui),
            Page::Calibration => self.calibration_page(ui),
            Page::GasCalculators => self.gas_page(ui),
            Page::Programs => self.programs_page(ui),
            Page::Logging => self.logging_page(ui),
            Page::Performance => self.performance_page(ui),
            Page::Diagnostics => self.diagnostics_page(ui),
        });
    }
}
