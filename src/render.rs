//! Summary rendering for tensor values.

use crate::error::Error;
use crate::handle::{Address, Scalar, ScalarKind, ValueHandle};
use crate::metadata::{self, Layout, TensorMetadata};
use crate::options::RenderOptions;
use ndarray::{ArrayD, ArrayViewD, Axis, Dimension, IxDyn};
use std::any::Any;

pub const UNREADABLE_PLACEHOLDER: &str = "<Tensor: unreadable>";
pub const TRUNCATION_MARKER: &str = "...";

/// A display handler the host invokes for values matching a registered
/// type pattern.
pub trait SummaryProvider: Send + Sync {
    fn summarize(
        &self,
        handle: Option<&dyn ValueHandle>,
        context: &dyn Any,
        options: &RenderOptions,
    ) -> String;
}

/// The tensor summary handler. Stateless; every call re-reads target memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct TensorSummary;

impl SummaryProvider for TensorSummary {
    fn summarize(
        &self,
        handle: Option<&dyn ValueHandle>,
        context: &dyn Any,
        options: &RenderOptions,
    ) -> String {
        render(handle, context, options)
    }
}

/// Renders a one-line summary of the tensor behind `handle`.
///
/// Never fails: missing fields, unreadable memory and inconsistent metadata
/// degrade the output, down to [`UNREADABLE_PLACEHOLDER`]. The result is
/// never empty and never longer than `options.max_total_chars` characters.
pub fn render(
    handle: Option<&dyn ValueHandle>,
    _context: &dyn Any,
    options: &RenderOptions,
) -> String {
    let options = options.clamped();
    let summary = match handle {
        Some(handle) => match metadata::extract(handle) {
            Ok(meta) => assemble(handle, &meta, &options),
            Err(_e) => {
                debug_println!("rendering placeholder: {}", _e);
                UNREADABLE_PLACEHOLDER.to_string()
            }
        },
        None => UNREADABLE_PLACEHOLDER.to_string(),
    };
    truncate(summary, options.max_total_chars)
}

fn assemble(handle: &dyn ValueHandle, meta: &TensorMetadata, options: &RenderOptions) -> String {
    let layout = meta.layout();
    let mut sections = Vec::with_capacity(3);
    if layout.annotate {
        sections.push(format!("shape={}", format_dims(&layout.dims)));
    }
    sections.push(format!("dtype={}", meta.element_kind));
    match render_data(handle, meta, &layout, options) {
        Ok(data) => sections.push(format!("data={}", data)),
        Err(_e) => {
            debug_println!("omitting data: {}", _e);
        }
    }
    format!("Tensor({})", sections.join(", "))
}

/// `[2,3]` style dims.
pub fn format_dims(dims: &[u64]) -> String {
    let inner: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
    format!("[{}]", inner.join(","))
}

/// Reads the leading `max_elements_per_dim` entries of each of the first
/// `max_depth` dims and renders them as nested brackets. A block past the
/// depth limit collapses into a single `[...]`.
fn render_data(
    handle: &dyn ValueHandle,
    meta: &TensorMetadata,
    layout: &Layout,
    options: &RenderOptions,
) -> Result<String, Error> {
    let depth = layout.dims.len().min(options.max_depth);
    let depth_cut = layout.dims.len() > depth;
    let sampled = if depth_cut { depth - 1 } else { depth };
    let grid = IxDyn(&sample_shape(&layout.dims[..sampled], options));

    let cells: Vec<Option<Scalar>> = if meta.element_count == 0 {
        // Nothing to read, but a pointer that exists and cannot be read still
        // marks the data as untrustworthy.
        match &meta.data_pointer {
            Ok(_) | Err(Error::FieldMissing(_)) => vec![None; grid.size()],
            Err(e) => return Err(e.clone()),
        }
    } else {
        let plan = ReadPlan::new(meta, layout)?;
        if depth_cut {
            // Every cell is a collapsed block; only confirm the buffer is there.
            plan.probe(handle)?;
            vec![None; grid.size()]
        } else {
            plan.read(handle, &grid)?
        }
    };
    let cells = ArrayD::from_shape_vec(grid, cells)
        .map_err(|e| Error::FieldUnreadable {
            field: "data".to_string(),
            reason: e.to_string(),
        })?;

    let mut out = String::new();
    write_block(&mut out, cells.view(), &layout.dims, options.float_precision);
    Ok(out)
}

/// How many entries of each dim to show.
///
/// Each dim is capped at `max_elements_per_dim`, and the number of cells
/// overall at half the character budget: a shown cell costs at least two
/// characters, so anything beyond that would be cut from the output anyway.
fn sample_shape(dims: &[u64], options: &RenderOptions) -> Vec<usize> {
    let cell_budget = (options.max_total_chars / 2).max(1);
    let mut cells = 1usize;
    dims.iter()
        .map(|&d| {
            let room = (cell_budget / cells).max(1);
            let shown = d.min(options.max_elements_per_dim.min(room) as u64) as usize;
            cells = cells.saturating_mul(shown.max(1));
            shown
        })
        .collect()
}

/// Where and how to read elements; only built when the data section can be
/// trusted.
struct ReadPlan {
    kind: ScalarKind,
    base: Address,
    strides: Vec<i64>,
    offset: i64,
}

impl ReadPlan {
    fn new(meta: &TensorMetadata, layout: &Layout) -> Result<Self, Error> {
        let kind = meta
            .element_kind
            .scalar_kind()
            .ok_or_else(|| Error::FieldUnreadable {
                field: "dtype".to_string(),
                reason: "unknown element kind".to_string(),
            })?;
        let base = meta.data_pointer.clone()?;
        if base.is_null() {
            return Err(Error::MemoryUnreadable { address: base });
        }
        let strides = layout.strides.clone()?;
        let offset = match &meta.storage_offset {
            Ok(offset) if *offset >= 0 => *offset,
            Ok(offset) => {
                return Err(Error::FieldUnreadable {
                    field: "storage_offset".to_string(),
                    reason: format!("negative offset {}", offset),
                })
            }
            Err(Error::FieldMissing(_)) => 0,
            Err(e) => return Err(e.clone()),
        };
        Ok(Self {
            kind,
            base,
            strides,
            offset,
        })
    }

    fn element_address(&self, index: &[usize]) -> Option<Address> {
        let element = index
            .iter()
            .zip(&self.strides)
            .try_fold(self.offset as i128, |acc, (&i, &stride)| {
                acc.checked_add((i as i128).checked_mul(stride as i128)?)
            })?;
        if element < 0 {
            return None;
        }
        let bytes = element.checked_mul(self.kind.size_in_bytes() as i128)?;
        self.base.offset(bytes)
    }

    /// Reads the first element of the view.
    fn probe(&self, handle: &dyn ValueHandle) -> Result<Scalar, Error> {
        let address = self
            .element_address(&[])
            .ok_or(Error::MemoryUnreadable { address: self.base })?;
        handle.read_scalar(self.kind, address)
    }

    /// Reads every cell of `grid` in row-major order. Any failed read
    /// abandons the whole data section.
    fn read(&self, handle: &dyn ValueHandle, grid: &IxDyn) -> Result<Vec<Option<Scalar>>, Error> {
        ndarray::indices(grid.clone())
            .into_iter()
            .map(|index| {
                let address = self
                    .element_address(index.slice())
                    .ok_or(Error::MemoryUnreadable { address: self.base })?;
                handle.read_scalar(self.kind, address).map(Some)
            })
            .collect()
    }
}

fn write_block(out: &mut String, view: ArrayViewD<Option<Scalar>>, dims: &[u64], precision: usize) {
    if view.ndim() == 0 {
        match (view.first(), dims.first().copied()) {
            (Some(Some(value)), _) => out.push_str(&format_scalar(*value, precision)),
            (_, Some(0)) => out.push_str("[]"),
            (_, Some(_)) => {
                out.push('[');
                out.push_str(TRUNCATION_MARKER);
                out.push(']');
            }
            (_, None) => out.push_str(TRUNCATION_MARKER),
        }
        return;
    }
    let shown = view.len_of(Axis(0));
    out.push('[');
    for (i, sub) in view.outer_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_block(out, sub, &dims[1..], precision);
    }
    if dims[0] > shown as u64 {
        if shown > 0 {
            out.push(',');
        }
        out.push_str(TRUNCATION_MARKER);
    }
    out.push(']');
}

pub fn format_scalar(value: Scalar, precision: usize) -> String {
    match value {
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(v) => v.to_string(),
        Scalar::UInt(v) => v.to_string(),
        Scalar::Float(v) => format_float(v, precision),
        Scalar::Pointer(a) => a.to_string(),
    }
}

/// Fixed-point with at most `precision` decimals, trailing zeros trimmed but
/// always keeping one decimal (`1.0`, `0.25`, `3.1416`).
pub fn format_float(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let mut s = format!("{:.*}", precision, value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').len();
        s.truncate(trimmed);
        if s.ends_with('.') {
            s.push('0');
        }
    } else {
        s.push_str(".0");
    }
    s
}

/// Cuts `summary` to `max_chars` characters, ending in the truncation marker
/// when anything was dropped.
pub fn truncate(summary: String, max_chars: usize) -> String {
    if summary.chars().count() <= max_chars {
        return summary;
    }
    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.len());
    let mut out: String = summary.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}
