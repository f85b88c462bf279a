use crate::shape::Shape;
use crate::{Error, Result};

// Tensor — dense, contiguous f32 n-dimensional array
//
// This is a data-carrier tensor, not a compute tensor: the pipeline needs
// construction, elementwise scaling, frame gathering along a dimension,
// and concatenation/stacking along the leading dimension.  Everything is
// stored contiguously in row-major order, so [C, T, H, W] clips and
// [G, C, T, H, W] gait samples share the same machinery.

/// Dense f32 tensor with row-major contiguous storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    shape: Shape,
}

impl Tensor {
    /// Create a tensor from a flat vector and a shape.
    ///
    /// Fails with [`Error::ElementCountMismatch`] when the vector length
    /// does not match the shape's element count.
    pub fn from_vec(data: Vec<f32>, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        if data.len() != shape.elem_count() {
            return Err(Error::ElementCountMismatch {
                expected: shape.elem_count(),
                got: data.len(),
                shape,
            });
        }
        Ok(Tensor { data, shape })
    }

    /// Create a zero-filled tensor.
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        Tensor {
            data: vec![0.0; shape.elem_count()],
            shape,
        }
    }

    /// Create a tensor filled with a constant value.
    pub fn full(shape: impl Into<Shape>, value: f32) -> Self {
        let shape = shape.into();
        Tensor {
            data: vec![value; shape.elem_count()],
            shape,
        }
    }

    /// The tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Total number of elements.
    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// Size of a specific dimension.
    pub fn dim(&self, d: usize) -> Result<usize> {
        self.shape.dim(d)
    }

    /// The raw data as a flat slice (row-major).
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consume the tensor, returning its flat data.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Elementwise multiplication by a scalar, returning a new tensor.
    pub fn scale(&self, factor: f32) -> Tensor {
        Tensor {
            data: self.data.iter().map(|v| v * factor).collect(),
            shape: self.shape.clone(),
        }
    }

    /// Reinterpret the tensor with a new shape of equal element count.
    pub fn reshape(&self, shape: impl Into<Shape>) -> Result<Tensor> {
        let shape = shape.into();
        if shape.elem_count() != self.elem_count() {
            return Err(Error::ElementCountMismatch {
                expected: shape.elem_count(),
                got: self.elem_count(),
                shape,
            });
        }
        Ok(Tensor {
            data: self.data.clone(),
            shape,
        })
    }

    /// Gather slices along dimension `dim` at the given indices.
    ///
    /// The output has the same shape except `dims[dim] == indices.len()`.
    /// Indices may repeat (nearest-neighbor temporal upsampling relies on
    /// this) and need not be ordered.
    pub fn index_select(&self, dim: usize, indices: &[usize]) -> Result<Tensor> {
        let dims = self.dims();
        if dim >= dims.len() {
            return Err(Error::DimOutOfRange {
                dim,
                rank: dims.len(),
            });
        }
        let dim_size = dims[dim];
        for &ix in indices {
            if ix >= dim_size {
                return Err(Error::IndexOutOfBounds {
                    index: ix,
                    dim,
                    dim_size,
                });
            }
        }

        // View the tensor as [outer, dim_size, inner]: gathering then
        // reduces to copying contiguous inner-sized runs.
        let outer: usize = dims[..dim].iter().product();
        let inner: usize = dims[dim + 1..].iter().product();

        let mut out_dims = dims.to_vec();
        out_dims[dim] = indices.len();
        let mut out = Vec::with_capacity(outer * indices.len() * inner);

        for o in 0..outer {
            let base = o * dim_size * inner;
            for &ix in indices {
                let start = base + ix * inner;
                out.extend_from_slice(&self.data[start..start + inner]);
            }
        }

        Tensor::from_vec(out, out_dims)
    }

    /// Concatenate tensors along the leading dimension.
    ///
    /// All inputs must share identical trailing dimensions; a violation
    /// fails with [`Error::ShapeMismatch`].
    pub fn cat(parts: &[&Tensor]) -> Result<Tensor> {
        let first = parts
            .first()
            .ok_or_else(|| Error::msg("cat: need at least one tensor"))?;
        if first.rank() == 0 {
            return Err(Error::RankMismatch {
                expected: 1,
                got: 0,
            });
        }
        let trailing = &first.dims()[1..];

        let mut lead = 0usize;
        for part in parts {
            if part.rank() != first.rank() || &part.dims()[1..] != trailing {
                return Err(Error::ShapeMismatch {
                    expected: first.shape.clone(),
                    got: part.shape.clone(),
                });
            }
            lead += part.dims()[0];
        }

        let mut data = Vec::with_capacity(lead * trailing.iter().product::<usize>().max(1));
        for part in parts {
            data.extend_from_slice(&part.data);
        }

        let mut out_dims = Vec::with_capacity(first.rank());
        out_dims.push(lead);
        out_dims.extend_from_slice(trailing);
        Tensor::from_vec(data, out_dims)
    }

    /// Stack tensors along a new leading dimension.
    ///
    /// All inputs must share the exact same shape; the output gains a
    /// leading dimension of size `parts.len()`.
    pub fn stack(parts: &[&Tensor]) -> Result<Tensor> {
        let first = parts
            .first()
            .ok_or_else(|| Error::msg("stack: need at least one tensor"))?;

        let mut data = Vec::with_capacity(parts.len() * first.elem_count());
        for part in parts {
            if part.shape != first.shape {
                return Err(Error::ShapeMismatch {
                    expected: first.shape.clone(),
                    got: part.shape.clone(),
                });
            }
            data.extend_from_slice(&part.data);
        }

        let mut out_dims = Vec::with_capacity(first.rank() + 1);
        out_dims.push(parts.len());
        out_dims.extend_from_slice(first.dims());
        Tensor::from_vec(data, out_dims)
    }
}
