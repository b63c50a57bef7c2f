pub mod grid;
pub mod input;
pub mod mode;
pub mod view;

// what a key press means, before anything touches the engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Up,
    Down,
    Left,
    Right,
    ToggleStep,
    PlayPress,
    NextInstrument,
    AdjustTempo(i32),
    AdjustVolume(f32),
    LoadDemo,
    Clear,
    Quit,
}
