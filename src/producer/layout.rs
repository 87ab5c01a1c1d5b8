//! Stream layouts and crop geometry
//!
//! A layout decides which streams exist, how they appear on the index page,
//! and which sensor region each crop stream shows. Crop windows are computed
//! once at startup and never change.
//!
//! Focus layout on a sensor, stream size `w`×`h`:
//!
//! ```text
//!  ┌──────────┬────────────────────────┬──────────┐
//!  │ stream2  │                        │ stream3  │  w/2 × h/2 at each corner
//!  ├──────────┘                        └──────────┤
//!  │            ┌────────────────────┐            │
//!  │            │      stream4       │            │  w × strip, centered
//!  │            └────────────────────┘            │
//!  ├──────────┐                        ┌──────────┤
//!  │ stream5  │                        │ stream6  │
//!  └──────────┴────────────────────────┴──────────┘
//! ```
//!
//! `stream.mjpg` shows the whole sensor scaled down to `w`×`h`.

use crate::registry::{Placement, RegistryError, StreamRegistry};

/// Path of the full-frame stream in every layout
pub const PRIMARY_PATH: &str = "/stream.mjpg";

/// Pixel rectangle on the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropWindow {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shrink/shift the window so it lies inside a `width`×`height` sensor
    pub fn clamp_to(self, width: u32, height: u32) -> Self {
        let w = self.width.min(width);
        let h = self.height.min(height);
        Self {
            x: self.x.min(width - w),
            y: self.y.min(height - h),
            width: w,
            height: h,
        }
    }

    /// Whether two windows share any pixel
    pub fn overlaps(&self, other: &CropWindow) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// A crop stream: where it is served and what it shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropSpec {
    pub path: String,
    pub window: CropWindow,
    pub placement: Placement,
}

/// Framing and focus aid: full view plus five detail crops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusLayout {
    /// Full sensor width in pixels
    pub sensor_width: u32,
    /// Full sensor height in pixels
    pub sensor_height: u32,
    /// Primary stream width
    pub stream_width: u32,
    /// Primary stream height
    pub stream_height: u32,
    /// Height of the centered horizontal strip
    pub strip_height: u32,
}

impl Default for FocusLayout {
    fn default() -> Self {
        Self {
            sensor_width: 2028,
            sensor_height: 1520,
            stream_width: 800,
            stream_height: 600,
            strip_height: 190,
        }
    }
}

impl FocusLayout {
    /// Reject sizes that would give an empty crop window
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.sensor_width == 0 || self.sensor_height == 0 {
            return Err(RegistryError::InvalidLayout(format!(
                "sensor size {}x{} is empty",
                self.sensor_width, self.sensor_height
            )));
        }
        // Corner crops are half the stream size
        if self.stream_width < 2 || self.stream_height < 2 {
            return Err(RegistryError::InvalidLayout(format!(
                "stream size {}x{} is too small for corner crops",
                self.stream_width, self.stream_height
            )));
        }
        if self.strip_height == 0 {
            return Err(RegistryError::InvalidLayout("strip height is zero".into()));
        }
        Ok(())
    }

    /// The five crop streams, in page order
    pub fn crops(&self) -> Vec<CropSpec> {
        let (sw, sh) = (self.sensor_width, self.sensor_height);
        let (w2, h2) = (self.stream_width / 2, self.stream_height / 2);

        let quadrant = |x: u32, y: u32| CropWindow::new(x, y, w2, h2).clamp_to(sw, sh);
        let right = sw.saturating_sub(w2);
        let bottom = sh.saturating_sub(h2);

        let strip = CropWindow::new(
            (sw / 2).saturating_sub(w2),
            (sh / 2).saturating_sub(self.strip_height / 2),
            self.stream_width,
            self.strip_height,
        )
        .clamp_to(sw, sh);

        vec![
            CropSpec {
                path: "/stream2.mjpg".into(),
                window: quadrant(0, 0),
                placement: Placement::new(w2, h2, 1),
            },
            CropSpec {
                path: "/stream3.mjpg".into(),
                window: quadrant(right, 0),
                placement: Placement::new(w2, h2, 1),
            },
            CropSpec {
                path: "/stream4.mjpg".into(),
                window: strip,
                placement: Placement::new(self.stream_width, self.strip_height, 2),
            },
            CropSpec {
                path: "/stream5.mjpg".into(),
                window: quadrant(0, bottom),
                placement: Placement::new(w2, h2, 3),
            },
            CropSpec {
                path: "/stream6.mjpg".into(),
                window: quadrant(right, bottom),
                placement: Placement::new(w2, h2, 3),
            },
        ]
    }
}

/// Which set of streams the server publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamLayout {
    /// One scaled-down full-frame stream
    Single { width: u32, height: u32 },
    /// Full-frame stream plus detail crops
    Focus(FocusLayout),
}

impl Default for StreamLayout {
    fn default() -> Self {
        StreamLayout::Single {
            width: 480,
            height: 270,
        }
    }
}

impl StreamLayout {
    /// Size of the primary stream
    pub fn primary_size(&self) -> (u32, u32) {
        match self {
            StreamLayout::Single { width, height } => (*width, *height),
            StreamLayout::Focus(focus) => (focus.stream_width, focus.stream_height),
        }
    }

    /// Crop streams (empty for a single-stream layout)
    pub fn crops(&self) -> Vec<CropSpec> {
        match self {
            StreamLayout::Single { .. } => Vec::new(),
            StreamLayout::Focus(focus) => focus.crops(),
        }
    }

    /// Check that every stream of the layout has a non-empty image
    pub fn validate(&self) -> Result<(), RegistryError> {
        match self {
            StreamLayout::Single { width, height } if *width == 0 || *height == 0 => Err(
                RegistryError::InvalidLayout(format!("stream size {}x{} is empty", width, height)),
            ),
            StreamLayout::Single { .. } => Ok(()),
            StreamLayout::Focus(focus) => focus.validate(),
        }
    }

    /// Build the registry holding one slot per stream of this layout
    pub fn registry(&self) -> Result<StreamRegistry, RegistryError> {
        self.validate()?;

        let (width, height) = self.primary_size();
        let builder = StreamRegistry::builder()
            .stream_at(PRIMARY_PATH, Placement::new(width, height, 0));

        self.crops()
            .into_iter()
            .fold(builder, |builder, crop| builder.stream_at(crop.path, crop.placement))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_windows() {
        let layout = FocusLayout {
            sensor_width: 2028,
            sensor_height: 1520,
            stream_width: 800,
            stream_height: 600,
            strip_height: 190,
        };
        let crops = layout.crops();
        let windows: Vec<_> = crops.iter().map(|c| c.window).collect();

        assert_eq!(windows[0], CropWindow::new(0, 0, 400, 300));
        assert_eq!(windows[1], CropWindow::new(1628, 0, 400, 300));
        assert_eq!(windows[2], CropWindow::new(614, 665, 800, 190));
        assert_eq!(windows[3], CropWindow::new(0, 1220, 400, 300));
        assert_eq!(windows[4], CropWindow::new(1628, 1220, 400, 300));
    }

    #[test]
    fn test_focus_windows_do_not_overlap() {
        let crops = FocusLayout::default().crops();

        for (i, a) in crops.iter().enumerate() {
            for b in crops.iter().skip(i + 1) {
                assert!(
                    !a.window.overlaps(&b.window),
                    "{} overlaps {}",
                    a.path,
                    b.path
                );
            }
        }
    }

    #[test]
    fn test_windows_clamped_to_small_sensor() {
        let layout = FocusLayout {
            sensor_width: 640,
            sensor_height: 480,
            stream_width: 800,
            stream_height: 600,
            strip_height: 190,
        };

        for crop in layout.crops() {
            let w = crop.window;
            assert!(w.x + w.width <= 640, "{:?}", crop);
            assert!(w.y + w.height <= 480, "{:?}", crop);
        }
        // Strip is as wide as the sensor allows
        assert_eq!(layout.crops()[2].window.width, 640);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(
            CropWindow::new(900, 10, 200, 50).clamp_to(1000, 1000),
            CropWindow::new(800, 10, 200, 50)
        );
        assert_eq!(
            CropWindow::new(0, 0, 2000, 50).clamp_to(1000, 1000),
            CropWindow::new(0, 0, 1000, 50)
        );
    }

    #[test]
    fn test_degenerate_sizes_rejected() {
        let tiny_stream = StreamLayout::Focus(FocusLayout {
            stream_width: 1,
            ..FocusLayout::default()
        });
        let no_strip = StreamLayout::Focus(FocusLayout {
            strip_height: 0,
            ..FocusLayout::default()
        });
        let no_sensor = StreamLayout::Focus(FocusLayout {
            sensor_height: 0,
            ..FocusLayout::default()
        });
        let empty_single = StreamLayout::Single {
            width: 0,
            height: 270,
        };

        for layout in [tiny_stream, no_strip, no_sensor, empty_single] {
            assert!(
                matches!(layout.registry(), Err(RegistryError::InvalidLayout(_))),
                "{:?} accepted",
                layout
            );
        }

        // Smallest layout that still yields 1x1 corner crops
        let smallest = FocusLayout {
            sensor_width: 4,
            sensor_height: 4,
            stream_width: 2,
            stream_height: 2,
            strip_height: 1,
        };
        assert!(StreamLayout::Focus(smallest).registry().is_ok());
        for crop in smallest.crops() {
            assert!(crop.window.width > 0 && crop.window.height > 0, "{:?}", crop);
        }
    }

    #[test]
    fn test_single_layout_registry() {
        let registry = StreamLayout::default().registry().unwrap();

        assert_eq!(registry.paths().collect::<Vec<_>>(), vec![PRIMARY_PATH]);
        let entry = registry.get(PRIMARY_PATH).unwrap();
        assert_eq!(entry.placement, Placement::new(480, 270, 0));
    }

    #[test]
    fn test_focus_layout_registry() {
        let registry = StreamLayout::Focus(FocusLayout::default()).registry().unwrap();

        assert_eq!(registry.stream_count(), 6);
        assert_eq!(
            registry.paths().collect::<Vec<_>>(),
            vec![
                "/stream.mjpg",
                "/stream2.mjpg",
                "/stream3.mjpg",
                "/stream4.mjpg",
                "/stream5.mjpg",
                "/stream6.mjpg"
            ]
        );
        assert_eq!(registry.get("/stream4.mjpg").unwrap().placement.row, 2);
    }
}
