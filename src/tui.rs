//! Terminal observer: an info panel plus a scrollable memory viewport,
//! driven by the same key bindings as the original curses UI (`c` step,
//! space-bar burst-step, arrow keys scroll, `a`/`d` select
//! previous/next organism). Holds no simulation state of its own — every
//! redraw re-reads `Engine`'s public observer surface after a `step`.

use crate::engine::Engine;
use crate::error::FungeraError;
use crate::vec2::Vec2;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, execute, terminal};
use std::io::{self, Write};
use std::time::Duration;

const BURST_STEPS: u64 = 10_000;

pub struct Tui {
    /// Top-left corner of the memory viewport, in Memory coordinates.
    position: Vec2,
    scroll_step: i64,
}

impl Tui {
    pub fn new(scroll_step: i64) -> Self {
        Tui {
            position: Vec2::ZERO,
            scroll_step,
        }
    }

    /// Enter raw mode, run the key-driven loop, and restore the terminal on
    /// exit (including on error or panic-free early return).
    pub fn run(&mut self, engine: &mut Engine) -> Result<(), FungeraError> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.input_loop(engine, &mut stdout);

        execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;
        result
    }

    fn input_loop(&mut self, engine: &mut Engine, stdout: &mut io::Stdout) -> Result<(), FungeraError> {
        self.draw(engine, stdout)?;
        loop {
            if !event::poll(Duration::from_millis(200))? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('c') => engine.step(),
                KeyCode::Char(' ') => {
                    for _ in 0..BURST_STEPS {
                        engine.step();
                    }
                }
                KeyCode::Down => self.position.row += self.scroll_step,
                KeyCode::Up => self.position.row -= self.scroll_step,
                KeyCode::Right => self.position.col += self.scroll_step,
                KeyCode::Left => self.position.col -= self.scroll_step,
                KeyCode::Char('d') => engine.select_next(),
                KeyCode::Char('a') => engine.select_previous(),
                KeyCode::Char('q') | KeyCode::Esc => break,
                _ => continue,
            }
            self.draw(engine, stdout)?;
        }
        Ok(())
    }

    fn draw(&self, engine: &Engine, stdout: &mut io::Stdout) -> Result<(), FungeraError> {
        execute!(stdout, Clear(ClearType::All), cursor::MoveTo(0, 0))?;

        writeln!(stdout, "Cycle      : {}\r", engine.cycle())?;
        writeln!(stdout, "Position   : [{}, {}]\r", self.position.row, self.position.col)?;
        let selected = engine.queue().selected_index();
        writeln!(stdout, "Organism   : {:?}\r", selected)?;
        if let Some(org) = engine.queue().get_selected() {
            writeln!(
                stdout,
                "  ip={:?} delta={:?} errors={} children={}\r",
                org.ip, org.delta, org.errors, org.children
            )?;
        }
        writeln!(stdout, "Population : {}\r", engine.queue().len())?;
        writeln!(stdout, "{}\r", "-".repeat(40))?;

        let (rows, cols) = terminal_viewport_size();
        let memory = engine.memory();
        for r in 0..rows {
            let addr_row = self.position.row + r as i64;
            for c in 0..cols {
                let addr = Vec2::new(addr_row, self.position.col + c as i64);
                let symbol = memory.cell(addr).unwrap_or(' ');
                let color = if memory.is_allocated(addr) {
                    Color::Cyan
                } else {
                    Color::DarkGrey
                };
                execute!(stdout, SetForegroundColor(color))?;
                write!(stdout, "{}", symbol)?;
                execute!(stdout, SetForegroundColor(Color::Reset))?;
            }
            write!(stdout, "\r\n")?;
        }
        stdout.flush()?;
        Ok(())
    }
}

fn terminal_viewport_size() -> (u16, u16) {
    match terminal::size() {
        Ok((cols, rows)) => (rows.saturating_sub(8).max(1), cols.max(1)),
        Err(_) => (20, 80),
    }
}
