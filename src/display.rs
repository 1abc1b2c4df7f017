use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
const DISPLAY_PIXELS: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

/// The machine's monochrome screen, one byte (0 or 1) per pixel, row-major.
/// Only the clear and draw instructions write to it.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: [u8; DISPLAY_PIXELS],
}

impl Default for Framebuffer {
    fn default() -> Self {
        Framebuffer {
            pixels: [0; DISPLAY_PIXELS],
        }
    }
}

impl Framebuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.pixels = [0; DISPLAY_PIXELS];
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * DISPLAY_WIDTH + x]
    }

    /// the whole 64x32 grid, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks(DISPLAY_WIDTH)
    }

    /// XOR a sprite onto the screen with its top-left corner at (x, y),
    /// wrapped into the screen. Rows and columns running off the right or
    /// bottom edge are clipped. Returns true if any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let x0 = x as usize % DISPLAY_WIDTH;
        let y0 = y as usize % DISPLAY_HEIGHT;
        let mut collision = false;
        for (row, bits) in sprite.iter().enumerate() {
            let py = y0 + row;
            if py >= DISPLAY_HEIGHT {
                break;
            }
            for col in 0..8 {
                let px = x0 + col;
                if px >= DISPLAY_WIDTH {
                    break;
                }
                if bits & (0x80 >> col) == 0 {
                    continue;
                }
                let p = &mut self.pixels[py * DISPLAY_WIDTH + px];
                if *p == 1 {
                    collision = true;
                }
                *p ^= 1;
            }
        }
        collision
    }

    /// text rendering for consoles and logs: '#' lit, '.' dark
    pub fn to_ascii(&self) -> String {
        let mut s = String::with_capacity((DISPLAY_WIDTH + 1) * DISPLAY_HEIGHT);
        for row in self.rows() {
            s.extend(row.iter().map(|&p| if p == 1 { '#' } else { '.' }));
            s.push('\n');
        }
        s
    }
}

/// Display is used by the interpreter to put frames on the screen. It should
/// abstract the implementation details, so a variety of kinds of screen would
/// work. It only ever sees snapshots, never the live framebuffer.
pub trait Display {
    /// draw a complete frame
    fn draw(&mut self, frame: &Framebuffer) -> Result<(), io::Error>;

    /// something else has written over the screen; repaint all of the
    /// next frame rather than just what changed
    fn invalidate(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}

// store useful metadata about the terminal
struct Resolution(usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coordinates of every pixel with the given value
    fn points_with_value<'a>(
        &self,
        data: &'a [u8],
        value: u8,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let w = self.0;
        data.iter()
            .take(self.pixel_count())
            .enumerate()
            .filter(move |&(_, &p)| p == value)
            .map(move |(i, _)| {
                (
                    (i % w) as f64,        // x
                    -1.0 * (i / w) as f64, // y
                )
            })
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(DISPLAY_WIDTH, DISPLAY_HEIGHT),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
    }
}

impl Display for MonoTermDisplay {
    fn invalidate(&mut self) -> Result<(), io::Error> {
        self.terminal.clear()?;
        self.terminal.hide_cursor()
    }

    fn draw(&mut self, frame: &Framebuffer) -> Result<(), io::Error> {
        let lit: Vec<(f64, f64)> = self
            .resolution
            .points_with_value(frame.pixels(), 1)
            .collect();
        let dark: Vec<(f64, f64)> = self
            .resolution
            .points_with_value(frame.pixels(), 0)
            .collect();
        let resolution = &self.resolution;

        // one terminal cell per pixel, plus the border
        self.terminal.draw(|f| {
            let size = Rect::new(
                0,
                0,
                2 + resolution.0 as u16,
                2 + resolution.1 as u16,
            )
            .intersection(f.size());

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &dark,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines; remembers the last frame
#[derive(Default)]
pub struct DummyDisplay {
    pub frames: usize,
    pub invalidations: usize,
    pub last: Option<Framebuffer>,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay::default()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, frame: &Framebuffer) -> Result<(), io::Error> {
        self.frames += 1;
        self.last = Some(frame.clone());
        Ok(())
    }

    fn invalidate(&mut self) -> Result<(), io::Error> {
        self.invalidations += 1;
        Ok(())
    }
}
