// Render pipeline: snapshot -> frame -> bar protocol stream.

mod format;

pub use format::fmt_size;

use std::io::{self, Write};

use crate::models::{Align, Block, Header, Reading};

const TITLE_MIN_WIDTH: u32 = 800;
const TITLE_BACKGROUNDS: [&str; 2] = ["#005577", "#007733"];
const WARN_COLOR: &str = "#FFCC00";
const URGENT_COLOR: &str = "#FF9999";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub name: String,
    pub reading: Reading,
}

/// Point-in-time copy of every unit's value plus the error slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub entries: Vec<SnapshotEntry>,
    pub error: Option<String>,
}

pub type Frame = Vec<Block>;

/// An error in the snapshot replaces all normal content for this frame.
pub fn render(snapshot: &Snapshot) -> Frame {
    if let Some(message) = &snapshot.error {
        return vec![Block {
            urgent: true,
            ..Block::new("error", message.clone())
        }];
    }
    let mut frame = Vec::with_capacity(snapshot.entries.len());
    for entry in &snapshot.entries {
        push_blocks(&mut frame, &entry.name, &entry.reading);
    }
    frame
}

fn push_blocks(frame: &mut Frame, name: &str, reading: &Reading) {
    match reading {
        Reading::Window(window) => {
            let bg = if window.layout_index == 0 {
                TITLE_BACKGROUNDS[0]
            } else {
                TITLE_BACKGROUNDS[1]
            };
            frame.push(Block {
                align: Some(Align::Center),
                min_width: Some(TITLE_MIN_WIDTH),
                background: Some(bg.to_string()),
                ..Block::new(name, window.title.clone())
            });
        }
        Reading::Cpu(cpu) => frame.push(Block::new(
            name,
            format!("CPU {:>2}%/{:>2}%", cpu.load, cpu.max_core_load),
        )),
        Reading::Memory(mem) => {
            frame.push(Block::new(name, format!("MEM {:>2}%", mem.used_percent)))
        }
        Reading::Scalar(scalar) => {
            let color = if scalar.is_urgent() {
                Some(URGENT_COLOR.to_string())
            } else if scalar.is_warning() {
                Some(WARN_COLOR.to_string())
            } else {
                None
            };
            frame.push(Block {
                color,
                urgent: scalar.is_urgent(),
                ..Block::new(
                    name,
                    format!("{} {}{}", scalar.label, scalar.value, scalar.suffix),
                )
            });
        }
        Reading::FreeSpace {
            entries,
            urgent_below_bytes,
        } => {
            let text = entries
                .iter()
                .map(|e| format!("{} {}", e.path.display(), fmt_size(e.available_bytes)))
                .collect::<Vec<_>>()
                .join(" ");
            frame.push(Block {
                urgent: entries
                    .iter()
                    .any(|e| e.available_bytes < *urgent_below_bytes),
                ..Block::new(name, text)
            });
        }
        Reading::Disk(disk) => frame.push(Block::new(
            name,
            format!(
                "{} {}/{}",
                disk.device,
                fmt_size(disk.read_bytes_per_sec),
                fmt_size(disk.write_bytes_per_sec)
            ),
        )),
        Reading::Volume(volume) => {
            let text = if volume.muted {
                "VOL muted".to_string()
            } else {
                format!("VOL {:>2}%", volume.percent)
            };
            frame.push(Block::new(name, text));
        }
        Reading::Network(interfaces) => {
            for iface in interfaces {
                frame.push(Block {
                    instance: Some(iface.name.clone()),
                    ..Block::new(
                        name,
                        format!(
                            "{} {}/{}",
                            iface.name,
                            fmt_size(iface.rx_bytes_per_sec),
                            fmt_size(iface.tx_bytes_per_sec)
                        ),
                    )
                });
            }
        }
        Reading::Clock(text) => frame.push(Block::new(name, text.clone())),
    }
}

/// Writes the header, then frames as elements of one unbounded JSON array.
///
/// Writes are blocking. With stdout, a bar that stops reading stalls the
/// calling runtime worker until the pipe drains or breaks, so the binary
/// runs on the multi-thread runtime.
pub struct BarWriter<W: Write> {
    out: W,
    frames_written: u64,
}

impl<W: Write> BarWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            frames_written: 0,
        }
    }

    /// `{"version":1}` on its own line, then the opening bracket.
    pub fn write_header(&mut self) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, &Header::default()).map_err(io::Error::from)?;
        self.out.write_all(b"\n[\n")?;
        self.out.flush()
    }

    /// One frame followed by `,` so the stream stays appendable.
    pub fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, frame).map_err(io::Error::from)?;
        self.out.write_all(b",\n")?;
        self.out.flush()?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
