use std::sync::Arc;
use std::time::{Duration, Instant};

use aimg_core::config::{AsciiConfig, MAX_OUTPUT_SIZE};
use aimg_core::frame::FrameBuffer;
use aimg_core::traits::VideoSource;
use aimg_engine::{ConversionEngine, EngineOptions, TickContext, TickOutcome, TimerToken, VideoScheduler};
use aimg_render::TerminalCanvas;
use aimg_source::VideoPlayer;
use anyhow::Result;
use arc_swap::ArcSwap;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::{DefaultTerminal, Frame};

/// Pas de `+`/`-` sur `max_output_size`.
const SIZE_STEP: u32 = 5;
/// Saut de `←`/`→`, en secondes.
const SEEK_STEP: f64 = 5.0;
/// Attente maximale d'un événement quand aucun tick n'est armé.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Média affiché.
pub enum Media {
    /// Image fixe, convertie une fois puis à chaque changement.
    Still(Arc<FrameBuffer>),
    /// Vidéo pilotée par le scheduler.
    Video(VideoPlayer),
}

/// Application state.
pub struct App {
    config: Arc<ArcSwap<AsciiConfig>>,
    applied: Arc<AsciiConfig>,
    engine: ConversionEngine,
    media: Media,
    source_name: String,
    input: TerminalCanvas,
    output: TerminalCanvas,
    scheduler: Option<VideoScheduler>,
    next_tick: Option<TimerToken>,
    max_output_size: u32,
    grid_size: (u32, u32),
    still_error: Option<String>,
    dirty: bool,
    quitting: bool,
}

impl App {
    /// # Errors
    /// Returns an error if the engine was not initialised or the frame rate
    /// is invalid.
    pub fn new(config: Arc<ArcSwap<AsciiConfig>>, media: Media, source_name: String) -> Result<Self> {
        let applied = config.load_full();
        let engine = ConversionEngine::global(EngineOptions::from_config(&applied))?;
        let scheduler = match media {
            Media::Video(_) => Some(VideoScheduler::new(applied.frame_rate)?),
            Media::Still(_) => None,
        };
        Ok(Self {
            max_output_size: applied.max_output_size,
            config,
            applied,
            engine,
            media,
            source_name,
            input: TerminalCanvas::preview(0, 0),
            output: TerminalCanvas::text(0, 0),
            scheduler,
            next_tick: None,
            grid_size: (0, 0),
            still_error: None,
            dirty: true,
            quitting: false,
        })
    }

    /// Main event loop.
    ///
    /// # Errors
    /// Returns an error if terminal operations fail.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        if let Some(s) = self.scheduler.as_mut() {
            self.next_tick = s.play(Instant::now());
        }

        while !self.quitting {
            self.apply_config_changes();

            let size = terminal.size()?;
            let (input_area, output_area, _) = panes(Rect::new(0, 0, size.width, size.height));
            self.fit_panes(input_area, output_area);

            match self.media {
                Media::Still(_) => self.convert_still(),
                Media::Video(_) => self.tick_video(),
            }

            terminal.draw(|frame| self.draw(frame))?;

            let timeout = self
                .next_tick
                .map_or(IDLE_POLL, |t| t.remaining(Instant::now()).min(IDLE_POLL));
            if event::poll(timeout)? {
                self.handle_event(&event::read()?);
                while event::poll(Duration::ZERO)? {
                    self.handle_event(&event::read()?);
                }
            }
        }

        if let Some(s) = self.scheduler.as_mut() {
            s.stop();
        }
        Ok(())
    }

    /// Inner sizes of the two bordered panes become the surfaces' viewports.
    fn fit_panes(&mut self, input_area: Rect, output_area: Rect) {
        let inner = |r: Rect| Block::bordered().inner(r);
        let (i, o) = (inner(input_area), inner(output_area));
        if self.input.viewport() != (i.width, i.height) {
            self.input.set_viewport(i.width, i.height);
            self.dirty = true;
        }
        if self.output.viewport() != (o.width, o.height) {
            self.output.set_viewport(o.width, o.height);
            self.dirty = true;
        }
    }

    /// Pick up a config published by the hot-reload watcher.
    fn apply_config_changes(&mut self) {
        let latest = self.config.load_full();
        if Arc::ptr_eq(&latest, &self.applied) {
            return;
        }
        let old = std::mem::replace(&mut self.applied, Arc::clone(&latest));

        if old.charset != latest.charset
            || old.font_path != latest.font_path
            || (old.font_size - latest.font_size).abs() > f32::EPSILON
        {
            match aimg_engine::init(&latest) {
                Ok(resources) => {
                    self.engine = ConversionEngine::new(resources, self.engine.options());
                }
                Err(e) => log::warn!("Rampe rechargée invalide, ancienne conservée : {e}"),
            }
        }
        self.engine.set_options(EngineOptions::from_config(&latest));

        if old.max_output_size != latest.max_output_size {
            self.max_output_size = latest.max_output_size;
        }

        if (old.frame_rate - latest.frame_rate).abs() > f64::EPSILON
            && let Some(s) = self.scheduler.as_mut()
        {
            s.stop();
            match VideoScheduler::new(latest.frame_rate) {
                Ok(mut fresh) => {
                    self.next_tick = fresh.play(Instant::now());
                    self.scheduler = Some(fresh);
                    log::info!("Cadence vidéo : {} fps", latest.frame_rate);
                }
                Err(e) => {
                    log::warn!("{e}");
                    self.next_tick = None;
                }
            }
        }
        self.dirty = true;
    }

    fn convert_still(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        let Media::Still(ref frame) = self.media else {
            return;
        };
        match self
            .engine
            .convert(frame, &mut self.input, &mut self.output, self.max_output_size)
        {
            Ok(conv) => {
                self.grid_size = (conv.glyphs.width, conv.glyphs.height);
                self.still_error = None;
            }
            Err(e) => {
                log::warn!("Conversion échouée : {e}");
                self.still_error = Some(e.to_string());
            }
        }
    }

    fn tick_video(&mut self) {
        let Media::Video(ref mut player) = self.media else {
            return;
        };
        let (Some(scheduler), Some(token)) = (self.scheduler.as_mut(), self.next_tick) else {
            return;
        };
        if !token.remaining(Instant::now()).is_zero() {
            return;
        }
        let report = scheduler.fire(
            token,
            TickContext {
                engine: &self.engine,
                source: player,
                input: &mut self.input,
                output: &mut self.output,
                max_output_size: self.max_output_size,
            },
        );
        self.next_tick = report.next;
        if let TickOutcome::Converted(conv) = report.outcome {
            self.grid_size = (conv.glyphs.width, conv.glyphs.height);
        }
    }

    fn handle_event(&mut self, event: &Event) {
        match *event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code),
            Event::Resize(..) => self.dirty = true,
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quitting = true,
            KeyCode::Char('+' | '=') => self.resize_output(SIZE_STEP, true),
            KeyCode::Char('-') => self.resize_output(SIZE_STEP, false),
            KeyCode::Char(' ') => {
                if let Media::Video(ref player) = self.media {
                    let paused = player.toggle_pause();
                    log::debug!("Pause : {paused}");
                }
            }
            KeyCode::Char('r') => {
                if let Media::Video(ref mut player) = self.media {
                    player.replay();
                }
            }
            KeyCode::Left => self.seek(-SEEK_STEP),
            KeyCode::Right => self.seek(SEEK_STEP),
            _ => {}
        }
    }

    fn resize_output(&mut self, step: u32, grow: bool) {
        self.max_output_size = step_size(self.max_output_size, step, grow);
        self.dirty = true;
    }

    fn seek(&mut self, delta: f64) {
        if let Media::Video(ref mut player) = self.media {
            player.seek(delta);
        }
    }

    fn status_line(&self) -> Line<'_> {
        let mut spans = vec![
            Span::styled(format!(" {} ", self.source_name), Style::new().fg(Color::Cyan)),
            Span::raw(format!(
                "│ {}×{} glyphes │ max {} ",
                self.grid_size.0, self.grid_size.1, self.max_output_size
            )),
        ];
        if let (Media::Video(player), Some(s)) = (&self.media, &self.scheduler) {
            let stats = s.stats();
            let state = if player.is_ended() {
                "fin"
            } else if player.is_paused() {
                "pause"
            } else {
                "lecture"
            };
            let cost = stats
                .last_convert
                .map_or_else(String::new, |d| format!(" {:.1} ms", d.as_secs_f64() * 1000.0));
            spans.push(Span::raw(format!(
                "│ {state} {:.1}s │ {:.0} fps{cost} ",
                player.position_secs(),
                1.0 / s.interval().as_secs_f64()
            )));
        }
        let error = match &self.scheduler {
            Some(s) => s.state().last_error.as_deref(),
            None => self.still_error.as_deref(),
        };
        if let Some(msg) = error {
            spans.push(Span::styled(format!("│ {msg} "), Style::new().fg(Color::Red)));
        }
        spans.push(Span::styled(
            "│ q quitter  espace pause  r rejouer  +/- taille  ←/→ ±5s",
            Style::new().fg(Color::DarkGray),
        ));
        Line::from(spans)
    }

    fn draw(&self, frame: &mut Frame) {
        let (input_area, output_area, status_area) = panes(frame.area());

        let block = Block::bordered().title(" source ");
        let inner = block.inner(input_area);
        frame.render_widget(block, input_area);
        frame.render_widget(&self.input, inner);

        let block = Block::bordered().title(" ascii ");
        let inner = block.inner(output_area);
        frame.render_widget(block, output_area);
        frame.render_widget(&self.output, inner);

        frame.render_widget(Paragraph::new(self.status_line()), status_area);
    }
}

/// Source preview on the left third, ASCII output on the rest, one status row.
fn panes(area: Rect) -> (Rect, Rect, Rect) {
    let [main, status] = Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);
    let [input, output] =
        Layout::horizontal([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)]).areas(main);
    (input, output, status)
}

/// `current ± step`, kept in `[1, MAX_OUTPUT_SIZE]`.
fn step_size(current: u32, step: u32, grow: bool) -> u32 {
    if grow {
        current.saturating_add(step).min(MAX_OUTPUT_SIZE)
    } else {
        current.saturating_sub(step).max(1)
    }
}
