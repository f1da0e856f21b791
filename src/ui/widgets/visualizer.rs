use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Block, Widget},
};

use crate::visualizer::{VisualStyle, CEILING};

/// Drawable primitives produced by the render mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// One bar per sample; height in sample units.
    Bar { slot: usize, height: f32 },
    /// One smoothed value per terminal column.
    WavePoint { column: usize, value: f32 },
    /// One dot per sample; radius in sample units, floored at 1.
    Dot { slot: usize, radius: f32 },
}

/// Evaluates a uniform quadratic B-spline through `points` at `u` in [0, 1].
///
/// Each output value is a convex combination of three neighboring control
/// points, so the curve never leaves the hull of the samples.
fn bspline_eval(points: &[f32], u: f32) -> f32 {
    match points.len() {
        0 => 0.0,
        1 => points[0],
        n => {
            let segments = n - 1;
            let x = u.clamp(0.0, 1.0) * segments as f32;
            let i = (x.floor() as usize).min(segments - 1);
            let t = x - i as f32;

            let p0 = points[i.saturating_sub(1)];
            let p1 = points[i];
            let p2 = points[(i + 1).min(n - 1)];

            0.5 * (1.0 - t) * (1.0 - t) * p0 + (0.5 + t * (1.0 - t)) * p1 + 0.5 * t * t * p2
        }
    }
}

/// Maps the sample buffer to drawable primitives for a visual style.
///
/// Pure: the samples are only read, never modified, so switching styles
/// cannot disturb the animation state.
pub fn shape(samples: &[f32], style: VisualStyle, columns: usize) -> Vec<Shape> {
    match style {
        VisualStyle::Bars => samples
            .iter()
            .enumerate()
            .map(|(slot, &height)| Shape::Bar { slot, height })
            .collect(),
        VisualStyle::Wave => {
            if columns == 0 {
                return Vec::new();
            }
            (0..columns)
                .map(|column| {
                    let u = if columns > 1 {
                        column as f32 / (columns - 1) as f32
                    } else {
                        0.0
                    };
                    Shape::WavePoint {
                        column,
                        value: bspline_eval(samples, u),
                    }
                })
                .collect()
        }
        VisualStyle::Dots => samples
            .iter()
            .enumerate()
            .map(|(slot, &v)| Shape::Dot {
                slot,
                radius: (v / 4.0).max(1.0),
            })
            .collect(),
    }
}

fn dot_glyph(radius: f32) -> &'static str {
    if radius < 2.5 {
        "·"
    } else if radius < 5.0 {
        "•"
    } else if radius < 7.5 {
        "●"
    } else {
        symbols::block::FULL
    }
}

/// Terminal rendering of the sample buffer in the selected style.
///
/// Playing draws with the bright primary color; paused drops to the dim
/// secondary color, the terminal analogue of the original opacity pair.
pub struct VisualizerWidget<'a> {
    samples: &'a [f32],
    style: VisualStyle,
    playing: bool,
    primary: Color,
    secondary: Color,
    block: Option<Block<'a>>,
}

impl<'a> VisualizerWidget<'a> {
    pub fn new(samples: &'a [f32], style: VisualStyle) -> Self {
        Self {
            samples,
            style,
            playing: false,
            primary: Color::White,
            secondary: Color::DarkGray,
            block: None,
        }
    }

    pub fn playing(mut self, playing: bool) -> Self {
        self.playing = playing;
        self
    }

    pub fn colors(mut self, primary: Color, secondary: Color) -> Self {
        self.primary = primary;
        self.secondary = secondary;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl<'a> Widget for VisualizerWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };

        if inner.width == 0 || inner.height == 0 || self.samples.is_empty() {
            return;
        }

        let style = Style::default().fg(if self.playing {
            self.primary
        } else {
            self.secondary
        });

        match self.style {
            VisualStyle::Bars => {
                let slot_width = (inner.width as usize / self.samples.len()).max(1) as u16;
                for primitive in shape(self.samples, VisualStyle::Bars, inner.width as usize) {
                    let Shape::Bar { slot, height } = primitive else {
                        continue;
                    };
                    let x = inner.x + slot as u16 * slot_width;
                    if x >= inner.right() {
                        break;
                    }
                    let cells = ((height / CEILING) * inner.height as f32).round() as u16;
                    let cells = cells.clamp(1, inner.height);
                    for dy in 0..cells {
                        let y = inner.bottom() - 1 - dy;
                        buf.get_mut(x, y)
                            .set_symbol(symbols::block::FULL)
                            .set_style(style);
                    }
                }
            }
            VisualStyle::Wave => {
                for primitive in shape(self.samples, VisualStyle::Wave, inner.width as usize) {
                    let Shape::WavePoint { column, value } = primitive else {
                        continue;
                    };
                    let x = inner.x + column as u16;
                    let dy = ((value / CEILING) * (inner.height - 1) as f32).round() as u16;
                    let y = inner.bottom() - 1 - dy.min(inner.height - 1);
                    buf.get_mut(x, y).set_symbol(symbols::DOT).set_style(style);
                }
            }
            VisualStyle::Dots => {
                let slot_width = (inner.width as usize / self.samples.len()).max(1) as u16;
                let y = inner.y + inner.height / 2;
                for primitive in shape(self.samples, VisualStyle::Dots, inner.width as usize) {
                    let Shape::Dot { slot, radius } = primitive else {
                        continue;
                    };
                    let x = inner.x + slot as u16 * slot_width;
                    if x >= inner.right() {
                        break;
                    }
                    buf.get_mut(x, y).set_symbol(dot_glyph(radius)).set_style(style);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualizer::{SampleBuffer, FLOOR};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn samples() -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(7);
        let mut buffer = SampleBuffer::new(&mut rng);
        for _ in 0..20 {
            buffer.tick(true, &mut rng);
        }
        buffer.samples().to_vec()
    }

    #[test]
    fn style_switch_leaves_samples_untouched() {
        let samples = samples();
        let before = samples.clone();

        shape(&samples, VisualStyle::Bars, 80);
        shape(&samples, VisualStyle::Wave, 80);
        shape(&samples, VisualStyle::Dots, 80);

        assert_eq!(samples, before);
    }

    #[test]
    fn bars_map_one_to_one() {
        let samples = samples();
        let shapes = shape(&samples, VisualStyle::Bars, 80);
        assert_eq!(shapes.len(), samples.len());
        for (i, primitive) in shapes.iter().enumerate() {
            match primitive {
                Shape::Bar { slot, height } => {
                    assert_eq!(*slot, i);
                    assert!((FLOOR..=CEILING).contains(height));
                }
                other => panic!("unexpected primitive: {:?}", other),
            }
        }
    }

    #[test]
    fn wave_stays_inside_sample_hull() {
        let samples = samples();
        let min = samples.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = samples.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        for primitive in shape(&samples, VisualStyle::Wave, 120) {
            let Shape::WavePoint { value, .. } = primitive else {
                panic!("unexpected primitive");
            };
            assert!(value >= min - 1e-3 && value <= max + 1e-3);
        }
    }

    #[test]
    fn wave_emits_one_point_per_column() {
        let samples = samples();
        assert_eq!(shape(&samples, VisualStyle::Wave, 55).len(), 55);
        assert!(shape(&samples, VisualStyle::Wave, 0).is_empty());
    }

    #[test]
    fn dot_radius_is_floored_at_one() {
        let tiny = vec![FLOOR; 4];
        for primitive in shape(&tiny, VisualStyle::Dots, 40) {
            let Shape::Dot { radius, .. } = primitive else {
                panic!("unexpected primitive");
            };
            assert!(radius >= 1.0);
        }
    }

    #[test]
    fn widget_renders_without_panicking_in_every_style() {
        let samples = samples();
        for style in [VisualStyle::Bars, VisualStyle::Wave, VisualStyle::Dots] {
            let area = Rect::new(0, 0, 60, 12);
            let mut buffer = Buffer::empty(area);
            VisualizerWidget::new(&samples, style)
                .playing(true)
                .colors(Color::Red, Color::DarkGray)
                .render(area, &mut buffer);
        }
    }
}
