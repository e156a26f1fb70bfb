//! Drawing backend wrapper that keeps font failures from aborting a render.
//!
//! Text goes through the system font stack, which may be missing or broken on
//! a headless host. A label that cannot be drawn is skipped and logged; every
//! other primitive is forwarded untouched.

use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
};
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

pub struct LabelSafeBackend<DB> {
    inner: DB,
}

impl<DB> LabelSafeBackend<DB> {
    pub fn new(inner: DB) -> Self {
        Self { inner }
    }
}

fn skip_label(text: &str, reason: &dyn std::fmt::Display) {
    warn!(label = text, reason = %reason, "skipping chart label");
}

impl<DB: DrawingBackend> DrawingBackend for LabelSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.fill_polygon(vert, style)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.inner.draw_text(text, style, pos))) {
            Ok(Err(DrawingErrorKind::FontError(err))) => {
                skip_label(text, &err);
                Ok(())
            }
            Ok(result) => result,
            Err(_) => {
                skip_label(text, &"font backend panicked");
                Ok(())
            }
        }
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        match panic::catch_unwind(AssertUnwindSafe(|| {
            self.inner.estimate_text_size(text, style)
        })) {
            Ok(Err(DrawingErrorKind::FontError(_))) | Err(_) => Ok((0, 0)),
            Ok(result) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotters::prelude::*;

    #[test]
    fn test_shapes_pass_through() {
        let mut buffer = vec![255u8; 20 * 20 * 3];
        {
            let backend = LabelSafeBackend::new(BitMapBackend::with_buffer(&mut buffer, (20, 20)));
            let root = backend.into_drawing_area();
            root.draw(&Rectangle::new([(0, 0), (10, 10)], BLACK.filled()))
                .unwrap();
            root.present().unwrap();
        }
        assert_eq!(&buffer[0..3], &[0, 0, 0]);
        let last = buffer.len() - 3;
        assert_eq!(&buffer[last..], &[255, 255, 255]);
    }

    #[test]
    fn test_text_never_fails_the_render() {
        let mut buffer = vec![255u8; 60 * 20 * 3];
        let backend = LabelSafeBackend::new(BitMapBackend::with_buffer(&mut buffer, (60, 20)));
        let root = backend.into_drawing_area();
        let drawn = root.draw(&Text::new("SI", (2, 2), ("sans-serif", 12).into_font()));
        assert!(drawn.is_ok());
    }
}
