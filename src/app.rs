mod button;
mod engine;
mod format;

use std::{
    cell::RefCell,
    io,
    rc::Rc,
    time::{Duration, Instant},
};

use ratatui::{
    DefaultTerminal, Frame,
    crossterm::event::{self, KeyCode, MouseEvent, MouseEventKind},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Styled, Stylize},
    symbols::border,
    widgets::{Block, Paragraph, Widget},
};

use button::Button;
use engine::{StateSnapshot, StopwatchEngine};

// how long a pressed button stays lit in millis
const PRESS_FLASH: u64 = 150;
/// Hold the time display this long to reset.
const LONG_PRESS: Duration = Duration::from_millis(500);
/// Poll granularity when no tick or gesture deadline is pending.
const IDLE_POLL: Duration = Duration::from_millis(50);

pub struct Stopwatch {
    exit: bool,

    engine: StopwatchEngine,
    display: Rc<RefCell<StateSnapshot>>,
    held: Option<Instant>,
    pressed: Option<(Button, Instant)>,
}

impl Stopwatch {
    pub fn run(terminal: &mut DefaultTerminal) -> io::Result<()> {
        let mut app = Self::new();

        while !app.exit {
            terminal.draw(|frame| app.draw(frame))?;
            app.handle_input(terminal)?;
            app.pump(Instant::now());
        }

        Ok(())
    }

    fn new() -> Self {
        let display = Rc::new(RefCell::new(StateSnapshot::default()));
        let mut engine = StopwatchEngine::new();
        let sink = Rc::clone(&display);
        engine.observe(move |snapshot| *sink.borrow_mut() = snapshot);

        Self {
            exit: false,
            engine,
            display,
            held: None,
            pressed: None,
        }
    }

    fn handle_input(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        if event::poll(self.poll_timeout(Instant::now()))? {
            let event = event::read()?;
            match event {
                event::Event::Key(key) => match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => self.exit = true,
                    KeyCode::Char(' ') | KeyCode::Enter => self.toggle(),
                    KeyCode::Char('r') => self.reset_pressed(),
                    _ => (),
                },
                event::Event::Mouse(mouse) => {
                    let area = terminal.get_frame().area();
                    self.mouse_event(mouse, area);
                }
                _ => (),
            }
        }
        Ok(())
    }

    fn mouse_event(&mut self, mouse: MouseEvent, area: Rect) {
        match mouse.kind {
            MouseEventKind::Down(_) => {
                let spot = Rect::new(mouse.column, mouse.row, 1, 1);
                let regions = Regions::of(area);

                if spot.intersects(regions.start_button) {
                    self.toggle();
                } else if spot.intersects(regions.reset_button) {
                    self.reset_pressed();
                } else if spot.intersects(regions.display) {
                    self.held = Some(Instant::now());
                }
            }
            MouseEventKind::Up(_) => self.held = None,
            _ => (),
        }
    }

    // The start button toggles on the last rendered state, not on the
    // engine directly.
    fn toggle(&mut self) {
        let running = self.display.borrow().is_running;
        if running {
            self.engine.pause();
        } else {
            self.engine.start(Instant::now());
        }
        self.pressed = Some((Button::StartPause, Instant::now()));
    }

    // Reset button and 'r'. Disabled while running; the long-press path in
    // pump() is the one that resets mid-run.
    fn reset_pressed(&mut self) {
        if self.display.borrow().is_running {
            return;
        }
        self.engine.reset();
        self.pressed = Some((Button::Reset, Instant::now()));
    }

    /// Deliver the tick that came due during the poll and fire a matured
    /// long-press. Runs once per loop turn.
    fn pump(&mut self, now: Instant) {
        self.engine.poll_tick(now);

        if let Some(held_since) = self.held {
            if now.duration_since(held_since) >= LONG_PRESS {
                self.held = None;
                self.engine.reset();
            }
        }
    }

    fn poll_timeout(&self, now: Instant) -> Duration {
        let mut timeout = IDLE_POLL;
        if let Some(due) = self.engine.next_tick_due() {
            timeout = timeout.min(due.saturating_duration_since(now));
        }
        if let Some(held_since) = self.held {
            timeout = timeout.min((held_since + LONG_PRESS).saturating_duration_since(now));
        }
        timeout
    }

    fn draw(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }
}

/// Screen regions shared by the renderer and mouse hit-testing.
struct Regions {
    title: Rect,
    display: Rect,
    start_button: Rect,
    reset_button: Rect,
}

impl Regions {
    fn of(area: Rect) -> Self {
        let vert = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(0),    // Time display
                Constraint::Length(5), // Buttons
            ])
            .split(area);

        let row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(0),         // ---
                Constraint::Percentage(25), // Start/Pause
                Constraint::Length(4),      // ---
                Constraint::Percentage(25), // Reset
                Constraint::Min(0),         // ---
            ])
            .split(vert[2]);

        Self {
            title: vert[0],
            display: vert[1],
            start_button: row[1],
            reset_button: row[3],
        }
    }
}

impl Widget for &Stopwatch {
    fn render(self, area: ratatui::prelude::Rect, buf: &mut ratatui::prelude::Buffer)
    where
        Self: Sized,
    {
        let state = self.display.borrow();
        let regions = Regions::of(area);

        Paragraph::new("Stopwatch-CLI")
            .set_style(Color::Blue)
            .centered()
            .block(Block::bordered().border_set(border::DOUBLE))
            .render(regions.title, buf);

        Block::bordered()
            .border_set(border::DOUBLE)
            .title("╡ Time ╞")
            .render(regions.display, buf);

        let main = regions.display.inner(ratatui::layout::Margin {
            horizontal: 1,
            vertical: 1,
        });

        let center = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(main);

        Paragraph::new(format::format_elapsed(state.elapsed_seconds))
            .bold()
            .centered()
            .render(center[1], buf);

        Paragraph::new("hold here to reset")
            .centered()
            .set_style(Color::DarkGray)
            .render(center[2], buf);

        Paragraph::new("Space to start/pause, 'r' to reset and Esc/'q' to quit")
            .centered()
            .set_style(Color::DarkGray)
            .render(center[4], buf);

        let mut flashed = None;
        if let Some((pressed, at)) = self.pressed {
            if (at.elapsed().as_millis() as u64) < PRESS_FLASH {
                flashed = Some(pressed);
            }
        }

        let start_bg = match (state.is_running, flashed == Some(Button::StartPause)) {
            (true, true) => Color::LightRed,
            (true, false) => Color::Red,
            (false, true) => Color::LightCyan,
            (false, false) => Color::Cyan,
        };
        let label = if state.is_running { "Pause" } else { "Start" };
        button(
            label,
            Style::default().bg(start_bg).fg(Color::Black),
            regions.start_button,
            buf,
        );

        let reset_style = if state.is_running {
            // disabled until paused; only the long-press resets mid-run
            Style::default().fg(Color::DarkGray)
        } else if flashed == Some(Button::Reset) {
            Style::default().fg(Color::LightYellow)
        } else {
            Style::default().fg(Color::Yellow)
        };
        button("Reset", reset_style, regions.reset_button, buf);
    }
}

fn button(text: &str, style: Style, area: Rect, buf: &mut ratatui::prelude::Buffer) {
    Paragraph::new(text)
        .set_style(style)
        .centered()
        .block(Block::bordered().border_set(border::THICK))
        .render(area, buf);
}
