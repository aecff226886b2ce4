use basic::video::matrix::ByteMatrix;
use basic::video::sprite::{PackedSpriteBuilder, SpriteBuilder};
use pretty_assertions::assert_eq;

fn sample() -> ByteMatrix {
    ByteMatrix::from_rows::<&[u8]>(&[&[1, 2, 3, 4], &[5, 6, 7, 8], &[9, 10, 11, 12]]).unwrap()
}

#[test]
fn test_view_aliasing() {
    let mut m = sample();
    let view = m.view();
    let copy = m.copy();
    m.set(0, 1.., 0).unwrap();
    assert_eq!(view.to_rows()[0], vec![1, 0, 0, 0]);
    assert_eq!(copy.to_rows()[0], vec![1, 2, 3, 4]);
}

#[test]
fn test_slice_writes_through_view() {
    let m = sample();
    let mut view = m.view();
    let mut inner = view.slice(1..3, 1..3);
    inner.set(.., .., 0xff).unwrap();
    assert_eq!(
        m.to_rows(),
        vec![vec![1, 2, 3, 4], vec![5, 0xff, 0xff, 8], vec![9, 0xff, 0xff, 12]]
    );
    view.set(2, 3, 0).unwrap();
    assert_eq!(m.get(2, 3), Some(0));
}

#[test]
fn test_move_overlap() {
    let mut m = sample();
    m.move_region(0..2, 0..3, 1, 1).unwrap();
    assert_eq!(
        m.to_rows(),
        vec![vec![0, 0, 0, 4], vec![0, 1, 2, 3], vec![9, 5, 6, 7]]
    );
}

#[test]
fn test_packing() {
    let row = ByteMatrix::from_rows::<&[u8]>(&[&[0, 1, 2, 4, 8, 16, 32, 64]]).unwrap();
    assert_eq!(row.packed(4), vec![0x18, 0x00]);
    let pixels = ByteMatrix::from_rows::<&[u8]>(&[&[0, 1, 2, 3], &[3, 2, 1, 0]]).unwrap();
    for &items in &[1, 2, 4] {
        assert_eq!(ByteMatrix::frompacked(&pixels.packed(items), 2, items), pixels);
    }
}

#[test]
fn test_sprite_record() {
    let builder = PackedSpriteBuilder::new(2);
    let sprite = ByteMatrix::from_rows::<&[u8]>(&[&[0, 1, 2], &[3, 2, 1]]).unwrap();
    let record = builder.pack(&sprite);
    assert_eq!(&record[..4], &[6, 0, 2, 0]);
    assert_eq!(builder.unpack(&record).unwrap(), sprite);
}
