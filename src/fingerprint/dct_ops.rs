use image::GrayImage;
use rustdct::DctPlanner;
use transpose::transpose_inplace;

/// Two dimensional DCT-II of a square grayscale image. Coefficients are returned in
/// row-major order, lowest frequencies first. The transform is unnormalized, which only
/// scales every coefficient by the same factor.
pub fn perform_dct(image: &GrayImage) -> Vec<f64> {
    let (x, y) = image.dimensions();
    assert_eq!(x, y, "dct input must be square, got {x}x{y}");
    let dimension = x as usize;

    let mut raw_vals = image.as_raw().iter().map(|x| f64::from(*x)).collect::<Vec<_>>();

    //setup the DCT.....
    let mut planner = DctPlanner::new();
    let dct = planner.plan_dct2(dimension);

    //perform round 1 of the DCT (on rows):
    raw_vals.chunks_exact_mut(dimension).for_each(|row| {
        dct.process_dct2(row);
    });

    //now tranpose...
    let mut scratch = vec![0f64; dimension];
    transpose_inplace(&mut raw_vals, &mut scratch, dimension, dimension);

    //perform round 2 of the DCT (on cols):
    raw_vals.chunks_exact_mut(dimension).for_each(|col| {
        dct.process_dct2(col);
    });

    //and transpose back so that rows are rows again.
    transpose_inplace(&mut raw_vals, &mut scratch, dimension, dimension);

    raw_vals
}

/// The top-left `size` x `size` corner of a square coefficient matrix.
pub fn low_frequencies(coeffs: &[f64], size: usize) -> Vec<f64> {
    let dimension = (coeffs.len() as f64).sqrt() as usize;
    assert!(size <= dimension);

    coeffs
        .chunks_exact(dimension)
        .take(size)
        .flat_map(|row| row[..size].iter().copied())
        .collect()
}

#[cfg(test)]
mod test {
    use image::{GrayImage, Luma};

    use super::*;

    #[test]
    fn test_flat_image_has_only_dc_component() {
        let img = GrayImage::from_pixel(8, 8, Luma([100]));
        let coeffs = perform_dct(&img);

        assert!(coeffs[0] > 0.0);
        for coeff in &coeffs[1..] {
            assert!(coeff.abs() < 1e-6, "expected zero, got {coeff}");
        }
    }

    #[test]
    fn test_horizontal_gradient_has_no_vertical_frequencies() {
        let img = GrayImage::from_fn(8, 8, |x, _y| Luma([(x * 30) as u8]));
        let coeffs = perform_dct(&img);

        //every row is identical, so only the first row of coefficients may be nonzero.
        for coeff in &coeffs[8..] {
            assert!(coeff.abs() < 1e-6, "expected zero, got {coeff}");
        }
        assert!(coeffs[1].abs() > 1.0);
    }

    #[test]
    fn test_low_frequencies() {
        let coeffs = (0..16).map(f64::from).collect::<Vec<_>>();
        assert_eq!(low_frequencies(&coeffs, 2), vec![0.0, 1.0, 4.0, 5.0]);
    }
}
