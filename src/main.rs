// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod calibration;
mod config;
mod debug_log;
mod diagnostics;
mod gas;
mod gui;
mod limits;
mod physiology;
mod programs;
mod recorder;
mod service;
mod types;
use config::DashboardConfig;
use eframe::egui;
use log::info;
// 入口函数
fn main() -> eframe::Result<()> {
    env_logger::init();
    let config = DashboardConfig::from_env();
    info!(
        "starting dashboard: poll {} ms, buffer {} samples",
        config.poll_interval_ms, config.buffer_capacity
    );
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 820.0])
        .with_min_inner_size([1024.0, 680.0])
        .with_title("ROBD2 Dashboard (Demo Mode)");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "ROBD2 Dashboard",
        options,
        Box::new(|_cc| Box::new(gui::Robd2App::new(config))),
    )
}
