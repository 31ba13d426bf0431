//! Utility functions used in the other roimask modules and by callers working with masked voxel data.

use ndarray::{Array2, Array3, Array4, Axis};

use crate::error::{Result, RoiMaskError};


/// Place masked voxel data back into a volume.
///
/// `data` holds one value per `true` voxel of `mask`, in row-major voxel order. All other voxels are `T::default()`.
///
/// # Examples
///
/// ```
/// let mask = ndarray::Array3::from_shape_vec((1, 1, 3), vec![true, false, true]).unwrap();
/// let vol = roimask::unmask(&mask, &[7, 9]).unwrap();
/// assert_eq!(vol.iter().copied().collect::<Vec<i32>>(), vec![7, 0, 9]);
/// ```
pub fn unmask<T>(mask: &Array3<bool>, data: &[T]) -> Result<Array3<T>>
where
    T: Clone + Default,
{
    check_masked_len(mask, data.len())?;
    let mut values = data.iter();
    let mut out = Array3::from_elem(mask.dim(), T::default());
    for (o, &m) in out.iter_mut().zip(mask.iter()) {
        if m {
            if let Some(v) = values.next() {
                *o = v.clone();
            }
        }
    }
    Ok(out)
}


/// Place masked multi-frame data back into a 4D volume. `data` has one row per frame; the frame is the first output axis.
pub fn unmask_frames<T>(mask: &Array3<bool>, data: &Array2<T>) -> Result<Array4<T>>
where
    T: Clone + Default,
{
    let (d0, d1, d2) = mask.dim();
    let num_frames = data.len_of(Axis(0));
    let mut out = Array4::from_elem((num_frames, d0, d1, d2), T::default());
    for (frame, mut target) in data.outer_iter().zip(out.outer_iter_mut()) {
        let frame_data: Vec<T> = frame.iter().cloned().collect();
        target.assign(&unmask(mask, &frame_data)?);
    }
    Ok(out)
}


fn check_masked_len(mask: &Array3<bool>, len: usize) -> Result<()> {
    let num_masked = mask.iter().filter(|&&m| m).count();
    if num_masked != len {
        return Err(RoiMaskError::invalid_input(format!(
            "mask selects {} voxels but {} values were given",
            num_masked, len
        )));
    }
    Ok(())
}
