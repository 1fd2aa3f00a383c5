//! Terminal host: owns the real I/O the core only talks to through its
//! collaborator seams — a crossterm render surface, a logging audio sink
//! and the debounced key map.

use std::collections::HashMap;
use std::io::{stdout, BufWriter, Write};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal, ExecutableCommand, QueueableCommand,
};
use rand::thread_rng;
use thiserror::Error;
use tracing::{debug, info, trace};
use tracing_subscriber::EnvFilter;

use canyon_run::audio::{AudioSink, Sound};
use canyon_run::display::{self, Surface, VIEW_HEIGHT, VIEW_WIDTH};
use canyon_run::input::KeyState;
use canyon_run::level::level_one;
use canyon_run::world::{Outcome, World};

const FRAME: Duration = Duration::from_millis(16); // ≈60 FPS

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames. Covers terminals that don't emit key-release events:
/// the OS key-repeat interval is shorter than this window, so a held key
/// keeps refreshing itself.
const HOLD_WINDOW: u64 = 8;

const MIN_COLS: u16 = 60;
const MIN_ROWS: u16 = 20;

// ── Host errors ───────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
enum HostError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("terminal too small: {cols}x{rows} (need at least {MIN_COLS}x{MIN_ROWS})")]
    TerminalTooSmall { cols: u16, rows: u16 },
}

// ── Audio sink ────────────────────────────────────────────────────────────────

/// The core decides when sounds happen; this host just logs them.
#[derive(Debug, Default)]
struct LogAudio {
    muted: bool,
}

impl AudioSink for LogAudio {
    fn play(&mut self, sound: Sound) {
        if !self.muted {
            trace!(?sound, "play");
        }
    }

    fn start_loop(&mut self, sound: Sound) {
        if !self.muted {
            debug!(?sound, "loop start");
        }
    }

    fn stop(&mut self, sound: Sound) {
        debug!(?sound, "loop stop");
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        debug!(muted, "mute toggled");
    }
}

// ── Terminal render surface ───────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct Transform {
    ox: f32,
    oy: f32,
    sx: f32,
}

const IDENTITY: Transform = Transform {
    ox: 0.0,
    oy: 0.0,
    sx: 1.0,
};

/// Cell-buffer surface. World rectangles are anchored at their bottom
/// centre and stamped as small glyph sprites; a negative x-scale on the
/// transform stack mirrors the art.
struct TermSurface {
    cols: u16,
    rows: u16,
    cells: Vec<(char, Color)>,
    current: Transform,
    stack: Vec<Transform>,
}

impl TermSurface {
    fn new(cols: u16, rows: u16) -> Self {
        TermSurface {
            cols,
            rows,
            cells: vec![(' ', Color::Reset); cols as usize * rows as usize],
            current: IDENTITY,
            stack: Vec::new(),
        }
    }

    fn put(&mut self, col: i32, row: i32, ch: char, color: Color) {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return;
        }
        self.cells[row as usize * self.cols as usize + col as usize] = (ch, color);
    }

    fn put_str(&mut self, col: i32, row: i32, text: &str, color: Color) {
        for (i, ch) in text.chars().enumerate() {
            self.put(col + i as i32, row, ch, color);
        }
    }

    /// Stamp multi-line glyph art, bottom-aligned and centred on `col`.
    fn stamp(&mut self, col: i32, bottom_row: i32, art: &[&str], color: Color, mirrored: bool) {
        for (i, line) in art.iter().enumerate() {
            let row = bottom_row - (art.len() as i32 - 1 - i as i32);
            let width = line.chars().count() as i32;
            let start = col - width / 2;
            if mirrored {
                for (j, ch) in line.chars().rev().enumerate() {
                    self.put(start + j as i32, row, mirror_char(ch), color);
                }
            } else {
                for (j, ch) in line.chars().enumerate() {
                    self.put(start + j as i32, row, ch, color);
                }
            }
        }
    }

    fn flush<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let mut last_color = Color::Reset;
        out.queue(style::SetForegroundColor(last_color))?;
        for row in 0..self.rows {
            out.queue(cursor::MoveTo(0, row))?;
            let mut text = String::with_capacity(self.cols as usize);
            for col in 0..self.cols {
                let (ch, color) = self.cells[row as usize * self.cols as usize + col as usize];
                if color != last_color && ch != ' ' {
                    out.queue(Print(std::mem::take(&mut text)))?;
                    out.queue(style::SetForegroundColor(color))?;
                    last_color = color;
                }
                text.push(ch);
            }
            out.queue(Print(text))?;
        }
        Ok(())
    }

    fn col_scale(&self) -> f32 {
        self.cols as f32 / VIEW_WIDTH
    }

    fn row_scale(&self) -> f32 {
        self.rows as f32 / VIEW_HEIGHT
    }
}

fn mirror_char(ch: char) -> char {
    match ch {
        '/' => '\\',
        '\\' => '/',
        '(' => ')',
        ')' => '(',
        '<' => '>',
        '>' => '<',
        '[' => ']',
        ']' => '[',
        _ => ch,
    }
}

impl Surface for TermSurface {
    fn clear(&mut self) {
        self.cells.fill((' ', Color::Reset));
        self.current = IDENTITY;
        self.stack.clear();
    }

    fn save(&mut self) {
        self.stack.push(self.current);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.current = t;
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.current.ox += self.current.sx * dx;
        self.current.oy += dy;
    }

    fn scale(&mut self, sx: f32, _sy: f32) {
        self.current.sx *= sx;
    }

    fn draw_image(&mut self, key: &str, x: f32, y: f32, w: f32, h: f32) {
        // Project both horizontal edges through the transform; a mirroring
        // transform swaps them, the on-screen span is the same.
        let e0 = self.current.ox + self.current.sx * x;
        let e1 = self.current.ox + self.current.sx * (x + w);
        let mid = (e0 + e1) * 0.5;
        let bottom = self.current.oy + y + h;

        // HUD bars are text, not sprites.
        if let Some(rest) = key.strip_prefix("bar/") {
            let (name, index) = rest.split_once('/').unwrap_or((rest, "0"));
            let filled = index.parse::<usize>().unwrap_or(0);
            let gauge: String = "█".repeat(filled) + &"-".repeat(5 - filled.min(5));
            let text = format!("{name:>6} [{gauge}]");
            let col = (mid * self.col_scale()) as i32;
            let row = (self.current.oy + y) as i32 / 50;
            self.put_str(col.max(0), row, &text, bar_color(name));
            return;
        }

        // The far background layers have no terminal representation; the
        // nearest one becomes the scrolling ground line.
        if key.starts_with("background/") {
            if key.starts_with("background/first/") {
                let row = ((VIEW_HEIGHT - 45.0) * self.row_scale()) as i32;
                let c0 = (e0.min(e1) * self.col_scale()) as i32;
                let c1 = (e0.max(e1) * self.col_scale()) as i32;
                for col in c0..c1 {
                    self.put(col, row, '═', Color::DarkYellow);
                }
            }
            return;
        }

        let Some((art, color)) = sprite_art(key) else {
            return; // unknown key — silently skipped, like an undecoded image
        };
        let col = (mid * self.col_scale()) as i32;
        let row = ((bottom * self.row_scale()) as i32).min(self.rows as i32 - 1);
        self.stamp(col, row, art, color, self.current.sx < 0.0);
    }
}

fn bar_color(name: &str) -> Color {
    match name {
        "health" => Color::Red,
        "coin" => Color::Yellow,
        "bottle" => Color::Green,
        "boss" => Color::Magenta,
        _ => Color::White,
    }
}

/// Glyph art per sprite family. Frames of one family share art except where
/// a second variant sells the motion.
fn sprite_art(key: &str) -> Option<(&'static [&'static str], Color)> {
    let art: (&'static [&'static str], Color) = match key {
        k if k.starts_with("character/dead") => (&["  _  ", "_/x\\_"], Color::DarkGrey),
        k if k.starts_with("character/hurt") => (&["  @  ", " /|\\ ", " /!  "], Color::Red),
        k if k.starts_with("character/jump") => (&["  @  ", " \\|/ ", "  ^  "], Color::White),
        k if k.starts_with("character/long_idle") => (&["  z  ", " (@) ", " _|_ "], Color::DarkGrey),
        "character/walk/2" | "character/walk/5" => (&["  @  ", " /|> ", " | \\ "], Color::White),
        k if k.starts_with("character/") => (&["  @  ", " /|> ", " / \\ "], Color::White),
        "hen/dead" => (&["_x_"], Color::DarkRed),
        k if k.starts_with("hen/") => (&["(o>", "/ \\"], Color::Yellow),
        "chick/dead" => (&["x"], Color::DarkRed),
        k if k.starts_with("chick/") => (&["(.>"], Color::DarkYellow),
        k if k.starts_with("boss/dead") => (&["  ___  ", "_/x x\\_"], Color::DarkRed),
        k if k.starts_with("boss/hurt") => (&[" {ò ó} ", " {###} ", " // \\\\ "], Color::Red),
        k if k.starts_with("boss/attack") => (&[" {Ò Ó}<", " {###} ", " // \\\\ "], Color::Magenta),
        k if k.starts_with("boss/") => (&[" {o o} ", " {###} ", " // \\\\ "], Color::Magenta),
        "coin/idle" => (&["$"], Color::Yellow),
        "bottle/ground" => (&["i"], Color::Green),
        k if k.starts_with("bottle/spin") => (&["ó"], Color::Green),
        k if k.starts_with("bottle/splash") => (&["*;*"], Color::Cyan),
        k if k.starts_with("cloud/") => (&["~~~~~"], Color::Grey),
        _ => return None,
    };
    Some(art)
}

// ── Held-key tracking ─────────────────────────────────────────────────────────

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn key_state(key_frame: &HashMap<KeyCode, u64>, frame: u64) -> KeyState {
    KeyState {
        left: is_held(key_frame, &KeyCode::Left, frame),
        right: is_held(key_frame, &KeyCode::Right, frame),
        up: is_held(key_frame, &KeyCode::Up, frame),
        down: is_held(key_frame, &KeyCode::Down, frame),
        space: is_held(key_frame, &KeyCode::Char(' '), frame),
        throw: is_held(key_frame, &KeyCode::Char('d'), frame)
            || is_held(key_frame, &KeyCode::Char('D'), frame),
    }
}

// ── Title screen ──────────────────────────────────────────────────────────────

enum MenuResult {
    Start,
    Quit,
}

fn show_title<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>) -> std::io::Result<MenuResult> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let lines: &[(&str, Color)] = &[
        ("☼  CANYON  RUN  ☼", Color::Yellow),
        ("", Color::Reset),
        ("Cross the canyon, stomp the hens,", Color::White),
        ("bottle the big one at the end.", Color::White),
        ("", Color::Reset),
        ("← → : Move   ↑ / SPACE : Jump   D : Throw", Color::DarkGrey),
        ("P : Pause   M : Mute   R : Retry   Q : Quit", Color::DarkGrey),
        ("", Color::Reset),
        ("ENTER — start", Color::Green),
    ];
    for (i, (msg, color)) in lines.iter().enumerate() {
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, cy.saturating_sub(5) + i as u16))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*msg))?;
    }
    out.queue(style::ResetColor)?;
    out.flush()?;

    loop {
        if let Ok(Event::Key(KeyEvent { code, kind, .. })) = rx.recv() {
            if kind != KeyEventKind::Press {
                continue;
            }
            match code {
                KeyCode::Enter => return Ok(MenuResult::Start),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit)
                }
                _ => {}
            }
        }
    }
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn draw_center<W: Write>(
    out: &mut W,
    row: u16,
    text: &str,
    color: Color,
) -> std::io::Result<()> {
    let (width, _) = terminal::size()?;
    let col = (width / 2).saturating_sub(text.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(text))?;
    Ok(())
}

fn draw_outcome<W: Write>(out: &mut W, world: &World) -> std::io::Result<()> {
    let (_, height) = terminal::size()?;
    let mid = height / 2;
    match world.outcome() {
        Some(Outcome::Won) => {
            draw_center(out, mid.saturating_sub(1), "★  YOU  WON  ★", Color::Yellow)?;
        }
        Some(Outcome::Lost) => {
            draw_center(out, mid.saturating_sub(1), "✝  GAME  OVER  ✝", Color::Red)?;
        }
        None => return Ok(()),
    }
    draw_center(out, mid, &world.coin_summary(), Color::White)?;
    draw_center(out, mid + 1, "R — retry   Q — quit", Color::DarkGrey)?;
    Ok(())
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Returns `true` → quit program, `false` → back to the title screen.
fn game_loop<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>) -> std::io::Result<bool> {
    let mut rng = thread_rng();
    let start = Instant::now();
    let mut world = World::new(level_one(), &mut rng, 0);
    let mut audio = LogAudio::default();

    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;

    loop {
        let frame_start = Instant::now();
        let now = start.elapsed().as_millis() as u64;
        frame += 1;

        // Drain all pending input events (non-blocking).
        while let Ok(Event::Key(KeyEvent {
            code,
            kind,
            modifiers,
            ..
        })) = rx.try_recv()
        {
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(true),
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(true)
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            // Fresh session; the old world's pending
                            // deadlines die with it.
                            info!("session reset");
                            world = World::new(level_one(), &mut rng, now);
                            audio = LogAudio::default();
                        }
                        KeyCode::Char('p') | KeyCode::Char('P') => world.toggle_pause(),
                        KeyCode::Char('m') | KeyCode::Char('M') => world.toggle_mute(&mut audio),
                        _ => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        let keys = key_state(&key_frame, frame);
        world.update(&keys, now, &mut audio);

        // The render tick does nothing while paused — the last frame stays.
        if world.paused {
            draw_center(out, 1, "· PAUSED ·", Color::White)?;
            out.flush()?;
        } else {
            let (cols, rows) = terminal::size()?;
            let mut surface = TermSurface::new(cols, rows);
            display::render(&mut surface, &world);
            out.queue(terminal::Clear(terminal::ClearType::All))?;
            surface.flush(out)?;

            out.queue(cursor::MoveTo(1, rows.saturating_sub(1)))?;
            out.queue(style::SetForegroundColor(Color::DarkGrey))?;
            out.queue(Print(world.coin_summary()))?;
            draw_outcome(out, &world)?;
            out.queue(style::ResetColor)?;
            out.flush()?;
        }

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_tracing() {
    // The terminal UI owns stdout; logs go to stderr and are filtered with
    // the usual RUST_LOG syntax.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("canyon_run=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<(), HostError> {
    init_tracing();

    let (cols, rows) = terminal::size()?;
    if cols < MIN_COLS || rows < MIN_ROWS {
        return Err(HostError::TerminalTooSmall { cols, rows });
    }

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release events where the terminal supports them; others
    // fall back to the hold-window heuristic.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread to blocking event reads so the frame loop never
    // waits on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let result = run(&mut out, &rx);

    // Always restore the terminal.
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result.map_err(HostError::from)
}

fn run<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>) -> std::io::Result<()> {
    loop {
        match show_title(out, rx)? {
            MenuResult::Quit => break,
            MenuResult::Start => {
                if game_loop(out, rx)? {
                    break;
                }
            }
        }
    }
    Ok(())
}
