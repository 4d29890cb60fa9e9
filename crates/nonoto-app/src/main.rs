//! nonoto - interactive score and spectrogram regeneration
//!
//! Usage: `nonoto [SCORE.musicxml] [--spectrogram]`
//!
//! Settings are read from `config.yaml` in the nonoto config directory.

mod ui;

use std::path::PathBuf;

use iced::{window, Size, Task};

use nonoto_core::config::{AppConfig, EditorMode};
use ui::message::{ControlMessage, GenerationMessage, Message};
use ui::NonotoApp;

fn main() -> iced::Result {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let force_spectrogram = args.iter().any(|arg| arg == "--spectrogram");
    let score_path = args.iter().find(|arg| !arg.starts_with("--")).map(PathBuf::from);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("nonoto starting up");

    let mut config = AppConfig::load_default();
    if force_spectrogram {
        config.mode = EditorMode::Spectrogram;
    }
    log::info!("Editor mode: {:?}, server: {}", config.mode, config.server_url);

    let app = match NonotoApp::new(config) {
        Ok(app) => app,
        Err(e) => {
            log::error!("Startup failed: {:#}", e);
            std::process::exit(1);
        }
    };
    let app_cell = std::cell::RefCell::new(Some(app));

    iced::application(
        move || {
            let app = app_cell.borrow_mut().take().expect("app already taken");

            let startup_task = match score_path.clone() {
                Some(path) => Task::perform(ui::handlers::generation::read_score(path), |result| {
                    Message::Generation(GenerationMessage::ScoreLoaded(result))
                }),
                None if app.spectrogram.is_some() => {
                    Task::done(Message::Controls(ControlMessage::CallToAction))
                }
                None => Task::none(),
            };

            (app, startup_task)
        },
        update,
        view,
    )
    .subscription(subscription)
    .theme(theme)
    .title("nonoto")
    .window(window::Settings {
        size: Size::new(1200.0, 600.0),
        exit_on_close_request: false,
        ..window::Settings::default()
    })
    .run()
}

fn update(app: &mut NonotoApp, message: Message) -> Task<Message> {
    app.update(message)
}

fn view(app: &NonotoApp) -> iced::Element<'_, Message> {
    app.view()
}

fn subscription(app: &NonotoApp) -> iced::Subscription<Message> {
    app.subscription()
}

fn theme(app: &NonotoApp) -> iced::Theme {
    app.theme()
}
