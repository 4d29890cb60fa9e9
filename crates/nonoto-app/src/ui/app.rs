//! Main iced application for nonoto
//!
//! Holds the transport, the editor (score or spectrogram), the controls and
//! the MIDI/Link bridges. Messages are dispatched to `handlers`.

use std::time::Instant;

use anyhow::{Context, Result};
use iced::widget::{button, checkbox, column, container, image, pick_list, row, slider, stack, text, Space};
use iced::{event, time, window, Center, Element, Event, Fill, Length, Subscription, Task, Theme};
use rand::rngs::StdRng;
use rand::SeedableRng;

use nonoto_core::config::{AppConfig, EditorMode};
use nonoto_core::controls::{BpmControl, GranularitySelect, InstrumentSelect, PitchRootAndOctave};
use nonoto_core::generation::{Codes, GenerationClient};
use nonoto_core::locator::sheet::{SheetLocator, SheetOptions};
use nonoto_core::locator::spectrogram::{Mask, SpectrogramLocator, SpectrogramRenderParams};
use nonoto_core::locator::{CallToAction, Locator};
use nonoto_core::playback::{MultiChannelSpectrogramPlaybackManager, SheetPlaybackManager, MAX_GAIN};
use nonoto_core::resources::StaticResources;
use nonoto_core::transport::Transport;
use nonoto_core::Size;
use nonoto_midi::{DownbeatFlash, KeyEvent, LinkClient, LocalSession, MidiKeyboardInput, MidiOutputSelector};
use nonoto_widgets::{cycle_select, downbeat_indicator, number_readout, number_slider, sheet_overlay, spectrogram_grid};

use super::handlers;
use super::message::{ControlMessage, Message, ShellMessage, TransportMessage};

/// UI refresh and scheduling period (~60 Hz)
const TICK_MS: u64 = 16;

/// Height reserved for the header and status bar
const CHROME_HEIGHT: f32 = 120.0;

/// Score editor state
pub struct SheetEditor {
    pub locator: SheetLocator,
    pub playback: SheetPlaybackManager,
    /// Current score as MusicXML
    pub musicxml: Option<String>,
    /// MIDI rendering of `musicxml`
    pub midi: Option<Vec<u8>>,
}

/// Spectrogram editor state
pub struct SpectrogramEditor {
    pub locator: SpectrogramLocator,
    pub playback: MultiChannelSpectrogramPlaybackManager,
    pub codes: Codes,
    pub image: Option<image::Handle>,
    /// WAV bytes of the latest generation
    pub audio: Option<Vec<u8>>,
    /// Masks handed over by the grid release callback
    pub masks: flume::Receiver<Mask>,
}

/// Application state
pub struct NonotoApp {
    pub config: AppConfig,
    pub resources: StaticResources,
    pub transport: Transport,
    pub last_tick: Instant,
    pub sheet: Option<SheetEditor>,
    pub spectrogram: Option<SpectrogramEditor>,
    pub bpm: BpmControl,
    pub granularity: GranularitySelect,
    pub instrument: InstrumentSelect,
    pub pitch: PitchRootAndOctave,
    pub midi_output: MidiOutputSelector,
    /// Kept alive for the connection, events arrive on `key_events`
    pub keyboard: Option<MidiKeyboardInput>,
    pub key_events: flume::Receiver<KeyEvent>,
    pub link: LinkClient<LocalSession>,
    pub downbeat: DownbeatFlash,
    pub call_to_action: Option<CallToAction>,
    pub rng: StdRng,
    pub client: GenerationClient,
    pub fade_in: bool,
    /// Generation requests in flight
    pub pending_requests: usize,
    pub status: String,
}

impl NonotoApp {
    /// Build the application from settings
    ///
    /// Fails when the configured controls are invalid (empty granularity list,
    /// BPM range too narrow) or the editor cannot be laid out.
    pub fn new(config: AppConfig) -> Result<Self> {
        let resources = StaticResources::detect(config.static_dir.as_deref());
        let icons = resources.resolve("icons");

        let mut transport = Transport::new(config.bpm.initial);
        let bpm = BpmControl::new(config.bpm.range, config.bpm.initial)
            .context("Invalid BPM settings")?;
        transport.set_bpm(bpm.value());

        let granularity = GranularitySelect::new(&config.granularities_quarters, icons.clone())
            .context("Invalid granularity settings")?;
        let instrument = InstrumentSelect::new(1, icons).context("Failed to build instrument select")?;
        let pitch = PitchRootAndOctave::new(false).context("Failed to build pitch control")?;

        let viewport = Size {
            width: 1200.0,
            height: 600.0 - CHROME_HEIGHT,
        };
        let (sheet, spectrogram) = match config.mode {
            EditorMode::Sheet => {
                let mut playback = SheetPlaybackManager::new();
                playback.set_low_latency(config.low_latency);
                let mut locator = SheetLocator::new(SheetOptions::from_config(&config), viewport);
                locator.set_granularity(granularity.value_quarters());
                let editor = SheetEditor {
                    locator,
                    playback,
                    musicxml: None,
                    midi: None,
                };
                (Some(editor), None)
            }
            EditorMode::Spectrogram => {
                let mut locator = SpectrogramLocator::new(viewport);
                locator.set_timesteps_top(config.spectrogram.timesteps_top);
                locator
                    .render(SpectrogramRenderParams {
                        rows: config.spectrogram.rows,
                        columns: config.spectrogram.columns,
                        columns_top: config.spectrogram.columns_top,
                        viewport,
                    })
                    .context("Failed to lay out the spectrogram grid")?;

                let (mask_tx, masks) = flume::unbounded();
                locator.register_callback(move |mask: &Mask| {
                    let _ = mask_tx.send(mask.clone());
                });

                let mut playback = MultiChannelSpectrogramPlaybackManager::new(&mut transport);
                playback.set_fade_in_enabled(true);
                let editor = SpectrogramEditor {
                    locator,
                    playback,
                    codes: Codes::new(),
                    image: None,
                    audio: None,
                    masks,
                };
                (None, Some(editor))
            }
        };

        let mut midi_output = MidiOutputSelector::new();
        if let Err(e) = midi_output.select(&config.midi_output) {
            log::warn!("MIDI: Could not open {:?}: {}", config.midi_output, e);
        }

        let (key_tx, key_events) = flume::bounded(256);
        let keyboard = config.midi_input.as_deref().and_then(|port_match| {
            match MidiKeyboardInput::connect(port_match, key_tx) {
                Ok(input) => Some(input),
                Err(e) => {
                    log::warn!("MIDI: Keyboard input unavailable: {}", e);
                    None
                }
            }
        });

        let client = GenerationClient::new(&config.server_url);
        let status = match config.mode {
            EditorMode::Sheet => "Open a score to start".to_string(),
            EditorMode::Spectrogram => "Paint cells on the grid to regenerate".to_string(),
        };

        Ok(Self {
            link: LinkClient::new(LocalSession::new(bpm.value())),
            config,
            resources,
            transport,
            last_tick: Instant::now(),
            sheet,
            spectrogram,
            bpm,
            granularity,
            instrument,
            pitch,
            midi_output,
            keyboard,
            key_events,
            downbeat: DownbeatFlash::default(),
            call_to_action: None,
            rng: StdRng::from_entropy(),
            client,
            fade_in: true,
            pending_requests: 0,
            status,
        })
    }

    /// Update application state
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => handlers::tick::handle(self),
            Message::Transport(msg) => handlers::playback::handle(self, msg),
            Message::Controls(msg) => handlers::controls::handle(self, msg),
            Message::Sheet(event) => handlers::editor::handle_sheet(self, event),
            Message::Grid(pointer) => handlers::editor::handle_grid(self, pointer),
            Message::Generation(msg) => handlers::generation::handle(self, msg),
            Message::Shell(msg) => handlers::shell::handle(self, msg),
            Message::WindowResized(size) => handlers::editor::handle_resize(self, size),
            Message::CloseRequested(id) => handlers::shell::handle_close(self, id),
        }
    }

    /// Periodic tick plus the window events we care about
    pub fn subscription(&self) -> Subscription<Message> {
        let tick = time::every(std::time::Duration::from_millis(TICK_MS)).map(|_| Message::Tick);
        let window_events = event::listen_with(|event, _status, id| match event {
            Event::Window(window::Event::Resized(size)) => Some(Message::WindowResized(size)),
            Event::Window(window::Event::CloseRequested) => Some(Message::CloseRequested(id)),
            _ => None,
        });
        Subscription::batch([tick, window_events])
    }

    pub fn view(&self) -> Element<'_, Message> {
        let header = self.view_header();

        let editor: Element<'_, Message> = if let Some(sheet) = &self.sheet {
            let highlighted = self.highlighted_cells();
            container(sheet_overlay(&sheet.locator, highlighted, Message::Sheet))
                .width(Fill)
                .height(Fill)
                .into()
        } else if let Some(spectrogram) = &self.spectrogram {
            let geometry = spectrogram.locator.geometry();
            let background: Element<'_, Message> = match &spectrogram.image {
                Some(handle) => image(handle.clone())
                    .width(Length::Fixed(geometry.image_width))
                    .height(Length::Fixed(geometry.image_height))
                    .into(),
                None => Space::new().width(Fill).height(Fill).into(),
            };
            let grid = spectrogram_grid(&spectrogram.locator, self.highlighted_cells(), Message::Grid);
            stack![background, grid].into()
        } else {
            Space::new().width(Fill).height(Fill).into()
        };

        let status_bar = container(text(&self.status).size(12)).padding(5);

        let content = column![header, editor, status_bar].spacing(10).padding(10);

        container(content).width(Fill).height(Fill).into()
    }

    fn view_header(&self) -> Element<'_, Message> {
        let title = text("nonoto").size(24);

        let transport_buttons = row![
            button(text("Play")).on_press(Message::Transport(TransportMessage::Play)),
            button(text("Stop")).on_press(Message::Transport(TransportMessage::Stop)),
        ]
        .spacing(5);

        let bpm = number_readout(self.bpm.control(), "BPM", |delta| {
            Message::Controls(ControlMessage::BpmDrag(delta))
        });

        let instrument = cycle_select(
            self.instrument.select(),
            "Instrument",
            Message::Controls(ControlMessage::NextInstrument),
        );

        let mode_controls: Element<'_, Message> = if self.sheet.is_some() {
            row![
                cycle_select(
                    self.granularity.select(),
                    "Granularity",
                    Message::Controls(ControlMessage::NextGranularity),
                ),
                button(text("-")).on_press(Message::Controls(ControlMessage::ZoomOut)),
                button(text("+")).on_press(Message::Controls(ControlMessage::ZoomIn)),
            ]
            .spacing(5)
            .align_y(Center)
            .into()
        } else {
            let gain = self.spectrogram.as_ref().map(|s| s.playback.gain()).unwrap_or(1.0);
            row![
                button(text(self.pitch.pitch().symbol()))
                    .on_press(Message::Controls(ControlMessage::NextPitch)),
                number_slider(self.pitch.octave_control(), "Octave", |octave| {
                    Message::Controls(ControlMessage::SetOctave(octave))
                }),
                checkbox(self.fade_in)
                    .label("Fade in")
                    .on_toggle(|enabled| Message::Controls(ControlMessage::ToggleFadeIn(enabled))),
                text("Gain").size(12),
                slider(0.0..=MAX_GAIN, gain, |gain| Message::Controls(ControlMessage::SetGain(gain)))
                    .step(0.05)
                    .width(100),
            ]
            .spacing(10)
            .align_y(Center)
            .into()
        };

        let midi_picker = pick_list(
            self.midi_output.devices().to_vec(),
            Some(self.midi_output.current().to_string()),
            |name| Message::Controls(ControlMessage::SelectMidiOutput(name)),
        )
        .width(Length::Fixed(180.0));
        let midi_refresh = button(text("Rescan")).on_press(Message::Controls(ControlMessage::RefreshMidiOutputs));

        let link = checkbox(self.link.is_enabled())
            .label("Link")
            .on_toggle(|enabled| Message::Transport(TransportMessage::ToggleLink(enabled)));
        let downbeat = downbeat_indicator(self.downbeat.is_lit(Instant::now()));

        let shell_buttons = row![
            button(text("Save")).on_press(Message::Shell(ShellMessage::SaveGeneration)),
            button(text("Drag")).on_press(Message::Shell(ShellMessage::DragOut)),
        ]
        .spacing(5);

        row![
            title,
            transport_buttons,
            bpm,
            instrument,
            mode_controls,
            Space::new().width(Fill),
            midi_picker,
            midi_refresh,
            link,
            downbeat,
            shell_buttons,
        ]
        .spacing(15)
        .align_y(Center)
        .padding(10)
        .into()
    }

    fn highlighted_cells(&self) -> &[usize] {
        self.call_to_action
            .as_ref()
            .map(|cta| cta.highlighted_at(Instant::now()))
            .unwrap_or(&[])
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    /// Container size available to the editor for a window of `size`
    pub fn editor_viewport(size: iced::Size) -> Size {
        Size {
            width: size.width,
            height: (size.height - CHROME_HEIGHT).max(0.0),
        }
    }
}
