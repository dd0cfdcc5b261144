use crate::sequence::SineSequence;

/// Jitter parameters of the tab currently being drawn.
///
/// `a` and `e` bend the curve near the cell ends, `b`/`d` shift the tab
/// along the edge, `c` shifts it across. `flip` selects which side the
/// tab bulges to.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TabState {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub flip: bool,
}

#[derive(Clone, Debug)]
pub struct TabGenerator {
    sequence: SineSequence,
    jitter: f64,
    state: TabState,
}

impl TabGenerator {
    pub fn new(seed: i64, jitter: f64) -> Self {
        Self {
            sequence: SineSequence::new(seed),
            jitter,
            state: TabState::default(),
        }
    }

    pub fn state(&self) -> TabState {
        self.state
    }

    /// Starts a new divider line. `flip` is carried over from the previous
    /// line; only `e` is re-rolled before the regular transition.
    pub fn first(&mut self) -> TabState {
        self.state.e = self.sequence.uniform(-self.jitter, self.jitter);
        self.next()
    }

    pub fn next(&mut self) -> TabState {
        let flip_old = self.state.flip;
        let flip = self.sequence.boolean();
        // The previous `e` control point is mirrored into `a` so the curve
        // leaves the shared anchor along the tangent it arrived on.
        let a = if flip == flip_old {
            -self.state.e
        } else {
            self.state.e
        };
        let j = self.jitter;
        let b = self.sequence.uniform(-j, j);
        let c = self.sequence.uniform(-j, j);
        let d = self.sequence.uniform(-j, j);
        let e = self.sequence.uniform(-j, j);
        self.state = TabState { a, b, c, d, e, flip };
        self.state
    }
}
