use crate::display::domain::display_layout::{fit_to_region, rotate_for_display, DisplayLayout};
use crate::display::domain::histogram_view::HistogramView;
use crate::histogram::domain::histogram_generator::HistogramGenerator;
use crate::shared::captured_image::CapturedImage;

/// Which regions of the histogram screen ended up populated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplayOutcome {
    pub image_shown: bool,
    pub histogram_shown: bool,
}

/// Histogram screen: show the captured image, then its intensity histogram
/// below it.
pub struct DisplayHistogramUseCase {
    view: Box<dyn HistogramView>,
    generator: Box<dyn HistogramGenerator>,
    layout: DisplayLayout,
}

impl DisplayHistogramUseCase {
    pub fn new(
        view: Box<dyn HistogramView>,
        generator: Box<dyn HistogramGenerator>,
        layout: DisplayLayout,
    ) -> Self {
        Self {
            view,
            generator,
            layout,
        }
    }

    /// Presents `image`. With no image both regions stay empty.
    ///
    /// Both regions are cleared first. Failures are logged and leave the
    /// affected region empty.
    pub fn execute(&mut self, image: Option<CapturedImage>) -> DisplayOutcome {
        let mut outcome = DisplayOutcome::default();
        if let Err(e) = self.view.clear() {
            log::warn!("could not clear histogram screen: {e}");
        }
        let Some(captured) = image else {
            log::info!("no captured image to display");
            return outcome;
        };

        let upright = rotate_for_display(captured.image());
        let fitted = fit_to_region(&upright, &self.layout.image_region());
        match self.view.show_image(&fitted) {
            Ok(()) => outcome.image_shown = true,
            Err(e) => log::warn!("could not show captured image: {e}"),
        }

        // The histogram is computed from the unrotated pixels
        let histogram = match self.generator.generate(captured.image()) {
            Ok(histogram) => histogram,
            Err(e) => {
                log::warn!("could not generate histogram: {e}");
                return outcome;
            }
        };
        let fitted = fit_to_region(&histogram, &self.layout.histogram_region());
        match self.view.show_histogram(&fitted) {
            Ok(()) => outcome.histogram_shown = true,
            Err(e) => log::warn!("could not show histogram: {e}"),
        }

        outcome
    }
}
