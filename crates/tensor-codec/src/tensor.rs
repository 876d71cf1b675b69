//! Fixed-layout float buffers
//!
//! All constructors validate the buffer length against the declared
//! geometry; a mismatch is a contract error, not a recoverable condition.

use crate::CodecError;

fn check_len(actual: usize, expected: usize, what: &str) -> Result<(), CodecError> {
    if actual != expected {
        return Err(CodecError::ShapeMismatch {
            expected: format!("{} ({} floats)", what, expected),
            actual: format!("{} floats", actual),
        });
    }
    Ok(())
}

/// Dense 1x3xHxW planar float image, values 0..1
#[derive(Debug, Clone)]
pub struct ImageTensor {
    data: Vec<f32>,
    width: u32,
    height: u32,
}

impl ImageTensor {
    /// Wrap a planar NCHW buffer of exactly 3*width*height floats
    pub fn new(data: Vec<f32>, width: u32, height: u32) -> Result<Self, CodecError> {
        check_len(data.len(), 3 * (width * height) as usize, "1x3xHxW image")?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Contiguous NCHW view handed to the engine
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Dense 1x1xHxW float mask plane, values 0..1
#[derive(Debug, Clone)]
pub struct MaskTensor {
    data: Vec<f32>,
    width: u32,
    height: u32,
}

impl MaskTensor {
    /// Wrap a single plane of exactly width*height floats
    pub fn new(data: Vec<f32>, width: u32, height: u32) -> Result<Self, CodecError> {
        check_len(data.len(), (width * height) as usize, "1x1xHxW mask")?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Engine output: HxWx3 row-major interleaved RGB floats, nominally 0..255.
///
/// Values outside 0..255 are tolerated here and saturated during decode.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    data: Vec<f32>,
    width: u32,
    height: u32,
}

impl OutputBuffer {
    /// Wrap an already-interleaved buffer of exactly width*height*3 floats
    pub fn from_interleaved(data: Vec<f32>, width: u32, height: u32) -> Result<Self, CodecError> {
        check_len(data.len(), (width * height * 3) as usize, "HxWx3 output")?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Convert a planar NCHW engine output into the interleaved layout.
    ///
    /// Accepts C=3 (planar RGB) or C=1 (grey, expanded to three identical
    /// channels). Any other plane count is rejected.
    pub fn from_planar(planar: &[f32], width: u32, height: u32) -> Result<Self, CodecError> {
        let plane = (width * height) as usize;
        if plane == 0 || planar.len() % plane != 0 {
            return Err(CodecError::ShapeMismatch {
                expected: format!("multiple of {}x{} plane", width, height),
                actual: format!("{} floats", planar.len()),
            });
        }

        let channels = planar.len() / plane;
        let mut data = vec![0.0f32; plane * 3];
        match channels {
            1 => {
                for (i, &g) in planar.iter().enumerate() {
                    data[i * 3] = g;
                    data[i * 3 + 1] = g;
                    data[i * 3 + 2] = g;
                }
            }
            3 => {
                let (r, rest) = planar.split_at(plane);
                let (g, b) = rest.split_at(plane);
                for i in 0..plane {
                    data[i * 3] = r[i];
                    data[i * 3 + 1] = g[i];
                    data[i * 3 + 2] = b[i];
                }
            }
            c => return Err(CodecError::UnsupportedChannels(c)),
        }

        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
