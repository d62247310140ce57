use lazyarray::{
    Array, ContinuationMode, DataDst, ElementKind, ErrorKind, Matrix, SimpleMemoryModel,
    UpdatableArray,
};

fn int_matrix(data: &[i32], dims: &[u64]) -> Matrix
{
    Matrix::new(SimpleMemoryModel.from_ints(data).clone_ref(), dims).unwrap()
}

#[test]
fn strict_requires_the_range_inside_the_base()
{
    let m = int_matrix(&[0; 16], &[4, 4]);
    assert!(m.sub_matrix(&[1, 1], &[2, 2], ContinuationMode::Strict).is_ok());
    let r = m.sub_matrix(&[3, 0], &[2, 2], ContinuationMode::Strict);
    assert_eq!(r.unwrap_err().kind(), ErrorKind::IndexOutOfBounds);
    let r = m.sub_matrix(&[-1, 0], &[2, 2], ContinuationMode::Strict);
    assert_eq!(r.unwrap_err().kind(), ErrorKind::IndexOutOfBounds);
}

#[test]
fn strict_fill_writes_through_to_the_backing_matrix()
{
    let backing = SimpleMemoryModel.new_array(ElementKind::F64, 16).unwrap();
    let m = Matrix::new(backing.clone_ref(), &[4, 4]).unwrap();
    let sub = m.sub_matrix(&[1, 1], &[2, 2], ContinuationMode::Strict).unwrap();

    sub.updatable_array().unwrap().fill(0, 4, 7.0).unwrap();

    let expected = [
        0.0, 0.0, 0.0, 0.0,
        0.0, 7.0, 7.0, 0.0,
        0.0, 7.0, 7.0, 0.0,
        0.0, 0.0, 0.0, 0.0,
    ];
    for (i, &want) in expected.iter().enumerate() {
        assert_eq!(backing.get_double(i as u64).unwrap(), want, "index {}", i);
    }
}

#[test]
fn constant_continuation_pads_with_the_outside_value()
{
    let m = int_matrix(&[1, 2, 3, 4], &[2, 2]);
    let sub = m.sub_matrix(&[-1, 0], &[4, 1], ContinuationMode::Constant(9.0)).unwrap();
    let got: Vec<i32> = (0..4).map(|i| sub.array().get_int(i).unwrap()).collect();
    assert_eq!(got, vec![9, 1, 2, 9]);

    // the bulk path pads the same way
    let mut buf = [0i32; 4];
    sub.array().get_data(0, &mut DataDst::Ints(&mut buf), 0, 4).unwrap();
    assert_eq!(buf, [9, 1, 2, 9]);
}

#[test]
fn constant_outside_value_narrows_to_the_element_kind()
{
    let m = Matrix::new(SimpleMemoryModel.from_bytes(&[1]).clone_ref(), &[1]).unwrap();
    let sub = m.sub_matrix(&[-1], &[2], ContinuationMode::Constant(300.0)).unwrap();
    assert_eq!(sub.array().get_int(0).unwrap(), 44);
    assert_eq!(sub.array().get_int(1).unwrap(), 1);
}

#[test]
fn constant_sub_matrices_compose_offsets()
{
    let m = int_matrix(&[0, 1, 2, 3, 4, 5, 6, 7, 8], &[3, 3]);
    let once = m.sub_matrix(&[-2, -1], &[7, 5], ContinuationMode::Constant(0.0)).unwrap();
    let twice = once.sub_matrix(&[1, 1], &[5, 4], ContinuationMode::Constant(0.0)).unwrap();
    let direct = m.sub_matrix(&[-1, 0], &[5, 4], ContinuationMode::Constant(0.0)).unwrap();
    assert_eq!(twice.size(), direct.size());
    for i in 0..direct.size() {
        assert_eq!(
            twice.array().get_int(i).unwrap(),
            direct.array().get_int(i).unwrap(),
            "index {}",
            i
        );
    }
}

#[test]
fn cyclic_wraps_each_coordinate()
{
    let m = int_matrix(&[0, 1, 2, 3, 4, 5, 6, 7, 8], &[3, 3]);
    let sub = m.sub_matrix(&[-1, -1], &[3, 3], ContinuationMode::Cyclic).unwrap();
    let got: Vec<i32> = (0..9).map(|i| sub.array().get_int(i).unwrap()).collect();
    // row -1 is row 2, column -1 is column 2
    assert_eq!(got, vec![8, 6, 7, 2, 0, 1, 5, 3, 4]);
}

#[test]
fn pseudo_cyclic_ignores_row_boundaries()
{
    let m = int_matrix(&[0, 1, 2, 3, 4, 5, 6, 7, 8], &[3, 3]);
    let sub = m.sub_matrix(&[-1, -1], &[3, 3], ContinuationMode::PseudoCyclic).unwrap();
    let got: Vec<i32> = (0..9).map(|i| sub.array().get_int(i).unwrap()).collect();
    // linear index of (-1, -1) is -4, that is 5 modulo 9
    assert_eq!(got, vec![5, 6, 7, 8, 0, 1, 2, 3, 4]);
}

#[test]
fn mirror_cyclic_reflects_at_the_bounds()
{
    let m = int_matrix(&[10, 20, 30, 40, 50], &[5]);
    let sub = m.sub_matrix(&[-3], &[10], ContinuationMode::MirrorCyclic).unwrap();
    let got: Vec<i32> = (0..10).map(|i| sub.array().get_int(i).unwrap()).collect();
    assert_eq!(got, vec![30, 20, 10, 10, 20, 30, 40, 50, 50, 40]);
}

#[test]
fn cyclic_writes_reach_the_base()
{
    let backing = SimpleMemoryModel.from_ints(&[0, 0, 0]);
    let m = Matrix::new(backing.clone_ref(), &[3]).unwrap();
    let sub = m.sub_matrix(&[-1], &[2], ContinuationMode::Cyclic).unwrap();
    let upd = sub.updatable_array().unwrap();
    upd.set_int(0, 7).unwrap();
    upd.set_int(1, 8).unwrap();
    assert_eq!(backing.get_int(2).unwrap(), 7);
    assert_eq!(backing.get_int(0).unwrap(), 8);
}

#[test]
fn outside_writes_are_discarded_under_constant_continuation()
{
    let backing = SimpleMemoryModel.from_ints(&[5]);
    let m = Matrix::new(backing.clone_ref(), &[1]).unwrap();
    let sub = m.sub_matrix(&[-1], &[3], ContinuationMode::Constant(0.0)).unwrap();
    let upd = sub.updatable_array().unwrap();
    upd.fill(0, 3, 9.0).unwrap();
    assert_eq!(backing.get_int(0).unwrap(), 9);
    assert_eq!(backing.len(), 1);
}

#[test]
fn sub_matrix_index_of_translates_correctly()
{
    let m = int_matrix(&[0, 1, 2, 3, 4, 5, 6, 7, 8], &[3, 3]);
    let sub = m.sub_matrix(&[1, 1], &[2, 2], ContinuationMode::Strict).unwrap();
    // the sub-matrix reads [4, 5, 7, 8]
    assert_eq!(sub.array().index_of(0, 4, 7.0), 2);
    assert_eq!(sub.array().index_of(0, 4, 0.0), -1);
    assert_eq!(sub.array().last_index_of(0, 4, 8.0), 3);
}
