use approx::assert_relative_eq;
use tensor_summary::test_utils::SyntheticTensor;
use tensor_summary::{render, ElementKind, RenderOptions, UNREADABLE_PLACEHOLDER};

fn render_default(tensor: &SyntheticTensor) -> String {
    let value = tensor.build();
    render(value.as_handle(), &(), &RenderOptions::default())
}

#[test]
fn test_float32_matrix() {
    let tensor = SyntheticTensor::float32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    assert_eq!(
        render_default(&tensor),
        "Tensor(shape=[2,3], dtype=float32, data=[[1.0,2.0,3.0],[4.0,5.0,6.0]])"
    );
}

#[test]
fn test_empty_tensor_without_other_fields() {
    let tensor = SyntheticTensor::new().size(0);
    assert_eq!(
        render_default(&tensor),
        "Tensor(shape=[0], dtype=unknown, data=[])"
    );
}

#[test]
fn test_unreadable_element_count() {
    let tensor = SyntheticTensor::float32(&[1.0, 2.0], &[2]).unreadable("size");
    assert_eq!(render_default(&tensor), UNREADABLE_PLACEHOLDER);
}

#[test]
fn test_long_vector_shows_leading_elements() {
    let values: Vec<f32> = (0..2000).map(|i| i as f32).collect();
    let tensor = SyntheticTensor::float32(&values, &[2000]).build();
    let options = RenderOptions::default().with_max_elements_per_dim(6);
    let summary = render(tensor.as_handle(), &(), &options);
    assert_eq!(
        summary,
        "Tensor(shape=[2000], dtype=float32, data=[0.0,1.0,2.0,3.0,4.0,5.0,...])"
    );
}

#[test]
fn test_null_handle() {
    let summary = render(None, &(), &RenderOptions::default());
    assert_eq!(summary, UNREADABLE_PLACEHOLDER);
}

#[test]
fn test_implausible_count_stops_reading() {
    for count in [-1i64, -5000, 1_000_000_000_001, i64::MAX] {
        let tensor = SyntheticTensor::float32(&[1.0; 4], &[2, 2])
            .size(count)
            .build();
        let summary = render(tensor.as_handle(), &(), &RenderOptions::default());
        assert_eq!(summary, UNREADABLE_PLACEHOLDER);
        // One lookup of `size` and one read of its value.
        assert_eq!(tensor.reads(), 2, "count {}", count);
    }
}

#[test]
fn test_count_at_ceiling_is_accepted() {
    let tensor = SyntheticTensor::new().size(1_000_000_000_000);
    assert_eq!(
        render_default(&tensor),
        "Tensor(shape=[1000000000000], dtype=unknown)"
    );
}

#[test]
fn test_render_is_idempotent() {
    let tensor = SyntheticTensor::float32(&[0.5, -1.25, 3.0, 7.75], &[2, 2]).build();
    let options = RenderOptions::default();
    let first = render(tensor.as_handle(), &(), &options);
    let second = render(tensor.as_handle(), &(), &options);
    assert_eq!(first, second);
}

#[test]
fn test_output_is_cut_to_character_budget() {
    let values: Vec<f64> = (0..36).map(|i| i as f64 * 1234.5678).collect();
    let tensor = SyntheticTensor::new()
        .size(36)
        .shape(&[6, 6])
        .dtype(ElementKind::Float64)
        .data_f64(&values)
        .build();
    let options = RenderOptions::default().with_max_total_chars(40);
    let summary = render(tensor.as_handle(), &(), &options);
    assert!(summary.chars().count() <= 40);
    assert!(summary.ends_with("..."));
    assert!(summary.starts_with("Tensor(shape=[6,6]"));
}

#[test]
fn test_integer_elements() {
    let tensor = SyntheticTensor::new()
        .size(4)
        .shape(&[2, 2])
        .dtype(ElementKind::Int32)
        .data_i32(&[1, -2, 3, -4]);
    assert_eq!(
        render_default(&tensor),
        "Tensor(shape=[2,2], dtype=int32, data=[[1,-2],[3,-4]])"
    );

    let tensor = SyntheticTensor::new()
        .size(3)
        .shape(&[3])
        .dtype(ElementKind::Int64)
        .data_i64(&[i64::MIN, 0, i64::MAX]);
    assert_eq!(
        render_default(&tensor),
        "Tensor(shape=[3], dtype=int64, data=[-9223372036854775808,0,9223372036854775807])"
    );
}

#[test]
fn test_unsigned_and_bool_elements() {
    let tensor = SyntheticTensor::new()
        .size(2)
        .shape(&[2])
        .dtype(ElementKind::UInt8)
        .data_u8(&[0, 255]);
    assert_eq!(
        render_default(&tensor),
        "Tensor(shape=[2], dtype=uint8, data=[0,255])"
    );

    let tensor = SyntheticTensor::new()
        .size(3)
        .shape(&[3])
        .dtype(ElementKind::Bool)
        .data_bool(&[true, false, true]);
    assert_eq!(
        render_default(&tensor),
        "Tensor(shape=[3], dtype=bool, data=[true,false,true])"
    );
}

#[test]
fn test_every_dimension_is_capped() {
    let values: Vec<f32> = (0..64).map(|i| i as f32).collect();
    let tensor = SyntheticTensor::float32(&values, &[8, 8]).build();
    let options = RenderOptions::default().with_max_elements_per_dim(2);
    assert_eq!(
        render(tensor.as_handle(), &(), &options),
        "Tensor(shape=[8,8], dtype=float32, data=[[0.0,1.0,...],[8.0,9.0,...],...])"
    );
}

#[test]
fn test_dimensions_past_max_depth_are_elided() {
    let tensor = SyntheticTensor::float32(&[1.0; 16], &[2, 2, 2, 2]).build();
    let summary = render(tensor.as_handle(), &(), &RenderOptions::default());
    assert_eq!(
        summary,
        "Tensor(shape=[2,2,2,2], dtype=float32, data=[[[...],[...]],[[...],[...]]])"
    );
}

#[test]
fn test_zero_dimensional_tensor() {
    let tensor = SyntheticTensor::float32(&[2.5], &[]);
    assert_eq!(
        render_default(&tensor),
        "Tensor(shape=[], dtype=float32, data=2.5)"
    );
}

#[test]
fn test_empty_inner_dimension() {
    let tensor = SyntheticTensor::new()
        .size(0)
        .shape(&[2, 0])
        .dtype(ElementKind::Float32);
    assert_eq!(
        render_default(&tensor),
        "Tensor(shape=[2,0], dtype=float32, data=[[],[]])"
    );
}

#[test]
fn test_floats_are_fixed_point() {
    let tensor = SyntheticTensor::new()
        .size(3)
        .shape(&[3])
        .dtype(ElementKind::Float64)
        .data_f64(&[0.1, std::f64::consts::PI, -2.5e-3]);
    let summary = render_default(&tensor);
    assert_eq!(
        summary,
        "Tensor(shape=[3], dtype=float64, data=[0.1,3.1416,-0.0025])"
    );

    let start = summary.find("data=[").unwrap() + "data=[".len();
    let parsed: Vec<f64> = summary[start..summary.len() - 2]
        .split(',')
        .map(|s| s.parse().unwrap())
        .collect();
    assert_relative_eq!(parsed[1], std::f64::consts::PI, epsilon = 1e-4);
    assert_relative_eq!(parsed[2], -2.5e-3, epsilon = 1e-4);
}

#[test]
fn test_float_precision_option() {
    let tensor = SyntheticTensor::float32(&[1.0 / 3.0], &[1]).build();
    let options = RenderOptions::default().with_float_precision(2);
    assert_eq!(
        render(tensor.as_handle(), &(), &options),
        "Tensor(shape=[1], dtype=float32, data=[0.33])"
    );
}

#[test]
fn test_non_finite_floats() {
    let tensor = SyntheticTensor::float32(&[f32::NAN, f32::INFINITY, f32::NEG_INFINITY], &[3]);
    assert_eq!(
        render_default(&tensor),
        "Tensor(shape=[3], dtype=float32, data=[nan,inf,-inf])"
    );
}
