/// State of the on-screen detection indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndicatorState {
    /// No face in the region of interest yet. Drawn red.
    Searching,
    /// A face was found and capture has stopped. Drawn green.
    Found,
}

impl IndicatorState {
    pub fn color(self) -> [u8; 3] {
        match self {
            IndicatorState::Searching => [255, 0, 0],
            IndicatorState::Found => [0, 255, 0],
        }
    }
}

/// The capture screen as the controller sees it.
///
/// Every call is made from the main context, never from the capture or
/// detection threads.
pub trait CaptureView {
    fn set_indicator(&mut self, state: IndicatorState);
    fn show_spinner(&mut self);
    fn hide_spinner(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_colors() {
        assert_eq!(IndicatorState::Searching.color(), [255, 0, 0]);
        assert_eq!(IndicatorState::Found.color(), [0, 255, 0]);
    }
}
