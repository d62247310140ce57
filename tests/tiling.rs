use lazyarray::{
    as_func_array, Array, DataDst, ElementKind, ErrorKind, Func, Matrix, SimpleMemoryModel,
    TiledArray, UpdatableArray,
};

#[test]
fn matrix_shape_must_match_the_backing_length()
{
    let a = SimpleMemoryModel.from_ints(&[0; 12]).clone_ref();
    assert!(Matrix::new(a.clone_ref(), &[3, 4]).is_ok());
    assert_eq!(
        Matrix::new(a.clone_ref(), &[3, 5]).unwrap_err().kind(),
        ErrorKind::SizeMismatch
    );
    assert_eq!(Matrix::new(a, &[]).unwrap_err().kind(), ErrorKind::InvalidArgument);
}

#[test]
fn index_and_coords_are_row_major_inverses()
{
    let m = Matrix::new(SimpleMemoryModel.from_ints(&[0; 24]).clone_ref(), &[2, 3, 4]).unwrap();
    assert_eq!(m.index(&[0, 0, 0]).unwrap(), 0);
    assert_eq!(m.index(&[1, 0, 0]).unwrap(), 1);
    assert_eq!(m.index(&[0, 1, 0]).unwrap(), 2);
    assert_eq!(m.index(&[0, 0, 1]).unwrap(), 6);
    assert_eq!(m.index(&[1, 2, 3]).unwrap(), 23);
    for i in 0..24 {
        let c = m.coords(i).unwrap();
        assert_eq!(m.index(&c).unwrap(), i);
    }
    assert_eq!(m.index(&[2, 0, 0]).unwrap_err().kind(), ErrorKind::IndexOutOfBounds);
    assert_eq!(m.dim(0), 2);
    assert_eq!(m.dim(7), 1);
}

#[test]
fn tiled_view_permutes_the_linear_order()
{
    // backing data 0..16 in tiled storage order, 4x4 matrix, 2x2 tiles
    let data: Vec<i32> = (0..16).collect();
    let m = Matrix::new(SimpleMemoryModel.from_ints(&data).clone_ref(), &[4, 4]).unwrap();
    let tiled = m.tile(&[2, 2]).unwrap();
    assert!(tiled.is_tiled());
    assert_eq!(tiled.tile_dims(), Some(vec![2, 2]));

    let expected = [0, 1, 4, 5, 2, 3, 6, 7, 8, 9, 12, 13, 10, 11, 14, 15];
    let got: Vec<i32> = (0..16).map(|i| tiled.array().get_int(i).unwrap()).collect();
    assert_eq!(got, expected);

    // the bulk path splits at tile-row boundaries and agrees with scalar reads
    let mut buf = [0i32; 16];
    tiled.array().get_data(0, &mut DataDst::Ints(&mut buf), 0, 16).unwrap();
    assert_eq!(buf, expected);
}

#[test]
fn partial_edge_tiles_keep_their_natural_shape()
{
    let data: Vec<i32> = (0..9).collect();
    let m = Matrix::new(SimpleMemoryModel.from_ints(&data).clone_ref(), &[3, 3]).unwrap();
    let tiled = m.tile(&[2, 2]).unwrap();
    let expected = [0, 1, 4, 2, 3, 5, 6, 7, 8];
    let got: Vec<i32> = (0..9).map(|i| tiled.array().get_int(i).unwrap()).collect();
    assert_eq!(got, expected);
}

#[test]
fn tiled_writes_land_in_tile_order()
{
    let backing = SimpleMemoryModel.new_array(ElementKind::I32, 16).unwrap();
    let m = Matrix::new(backing.clone_ref(), &[4, 4]).unwrap();
    let tiled = m.tile(&[2, 2]).unwrap();
    let upd = tiled.updatable_array().unwrap();
    for i in 0..16 {
        upd.set_int(i, i as i32).unwrap();
    }
    // natural index 2 lives at tiled offset 4
    assert_eq!(backing.get_int(4).unwrap(), 2);
    assert_eq!(backing.get_int(2).unwrap(), 4);
    assert_eq!(backing.get_int(15).unwrap(), 15);
}

#[test]
fn composition_lifts_identical_tilings()
{
    let a: Vec<i32> = (0..16).collect();
    let b: Vec<i32> = (0..16).map(|i| 15 - i).collect();
    let ma = Matrix::new(SimpleMemoryModel.from_ints(&a).clone_ref(), &[4, 4]).unwrap().tile(&[2, 2]).unwrap();
    let mb = Matrix::new(SimpleMemoryModel.from_ints(&b).clone_ref(), &[4, 4]).unwrap().tile(&[2, 2]).unwrap();

    let v = as_func_array(
        true,
        &Func::Max,
        ElementKind::I32,
        &[ma.array().clone_ref(), mb.array().clone_ref()],
    )
    .unwrap();

    // the function view over tiled sources is itself a tiled view over the
    // composed bases
    assert!(v.as_any().downcast_ref::<TiledArray>().is_some());
    for i in 0..16 {
        let want = ma.array().get_int(i).unwrap().max(mb.array().get_int(i).unwrap());
        assert_eq!(v.get_int(i).unwrap(), want);
    }
}

#[test]
fn differently_tiled_sources_compose_element_wise()
{
    let a: Vec<i32> = (0..16).collect();
    let ma = Matrix::new(SimpleMemoryModel.from_ints(&a).clone_ref(), &[4, 4]).unwrap().tile(&[2, 2]).unwrap();
    let mb = Matrix::new(SimpleMemoryModel.from_ints(&a).clone_ref(), &[4, 4]).unwrap().tile(&[4, 1]).unwrap();

    let v = as_func_array(
        true,
        &Func::Min,
        ElementKind::I32,
        &[ma.array().clone_ref(), mb.array().clone_ref()],
    )
    .unwrap();
    assert!(v.as_any().downcast_ref::<TiledArray>().is_none());
    for i in 0..16 {
        let want = ma.array().get_int(i).unwrap().min(mb.array().get_int(i).unwrap());
        assert_eq!(v.get_int(i).unwrap(), want);
    }
}

#[test]
fn tile_rank_and_size_are_validated()
{
    let m = Matrix::new(SimpleMemoryModel.from_ints(&[0; 12]).clone_ref(), &[3, 4]).unwrap();
    assert_eq!(m.tile(&[2]).unwrap_err().kind(), ErrorKind::InvalidArgument);
    assert_eq!(m.tile(&[0, 2]).unwrap_err().kind(), ErrorKind::InvalidArgument);
    assert!(m.tile(&[5, 5]).is_ok());
}
