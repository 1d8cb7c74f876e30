//! End-to-end buffer scenarios exercising the public API only.

use lowpy_core::{Buffer, BufferConfig, BufferError};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
#[allow(clippy::approx_constant)]
fn mixed_typed_values_share_one_buffer() {
    init_logging();
    let mut buffer = Buffer::with_size(16).unwrap();

    buffer.write(42i32, 0).unwrap();
    assert_eq!(buffer.read::<i32>(0).unwrap(), 42);

    buffer.write(3.14f64, 8).unwrap();
    assert_eq!(buffer.read::<f64>(8).unwrap(), 3.14);
    assert_eq!(buffer.read::<i32>(0).unwrap(), 42);
}

#[test]
fn oversized_raw_write_is_rejected_whole() {
    init_logging();
    let mut buffer = Buffer::with_size(4).unwrap();
    buffer.write_raw(&[1, 2, 3, 4], 0).unwrap();

    let err = buffer.write_raw(&[9, 9, 9, 9, 9, 9], 0).unwrap_err();
    assert_eq!(
        err,
        BufferError::OutOfBounds {
            offset: 0,
            width: 6,
            len: 4
        }
    );
    assert_eq!(buffer.len(), 4);
    assert_eq!(buffer.to_vec(), vec![1, 2, 3, 4]);
}

#[test]
fn empty_source_copy_clears_target() {
    init_logging();
    let source = Buffer::new();
    let mut target = Buffer::with_size(100).unwrap();
    source.copy_into(&mut target).unwrap();
    assert_eq!(target.len(), 0);
}

#[test]
fn grow_then_shrink_by_reallocation_cycle() {
    init_logging();
    let mut buffer = Buffer::new();
    buffer.reallocate(4).unwrap();
    buffer.write(7i32, 0).unwrap();
    buffer.reallocate(4).unwrap();
    buffer.write(8i32, 4).unwrap();
    assert_eq!(buffer.len(), 8);
    assert_eq!(buffer.read::<i32>(0).unwrap(), 7);
    assert_eq!(buffer.read::<i32>(4).unwrap(), 8);

    buffer.deallocate();
    assert_eq!(buffer.len(), 0);
    assert!(buffer.read::<i32>(0).is_err());

    buffer.allocate(2).unwrap();
    assert_eq!(buffer.len(), 2);
}

#[test]
fn copies_stay_independent_in_both_directions() {
    init_logging();
    let mut source = Buffer::with_size(8).unwrap();
    source.write(1.0f32, 0).unwrap();
    let mut target = source.try_clone().unwrap();

    target.write(2.0f32, 0).unwrap();
    source.write(3.0f32, 4).unwrap();

    assert_eq!(source.read::<f32>(0).unwrap(), 1.0);
    assert_eq!(target.read::<f32>(0).unwrap(), 2.0);
    assert_ne!(target.read::<f32>(4).unwrap(), 3.0);
}

#[test]
fn limited_buffer_reports_allocation_kind() {
    init_logging();
    let mut buffer = Buffer::with_config(BufferConfig::new(1024)).unwrap();
    buffer.allocate(1024).unwrap();
    let err = buffer.reallocate(1).unwrap_err();
    assert!(err.is_allocation());
    assert!(err.to_string().contains("exceeds limit"));
    assert_eq!(buffer.len(), 1024);
}
