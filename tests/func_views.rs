use itertools::Itertools;

use lazyarray::{
    as_func_array, n_copies, ArrRef, Array, DataDst, ElementKind, ErrorKind, Func, LinearFunc,
    SimpleMemoryModel,
};

fn ints(data: &[i32]) -> ArrRef
{
    SimpleMemoryModel.from_ints(data).clone_ref()
}

#[test]
fn table_kernel_over_bits()
{
    let bits = SimpleMemoryModel.from_bits(&[true, false, true, true, false]).clone_ref();
    let f = Func::Linear(LinearFunc::of_one(-50.0, 100.0));
    let v = as_func_array(true, &f, ElementKind::U8, &[bits]).unwrap();
    let got: Vec<i32> = (0..5).map(|i| v.get_int(i).unwrap()).collect();
    assert_eq!(got, vec![50, 100, 50, 50, 100]);

    let mut buf = [0u8; 5];
    v.get_data(0, &mut DataDst::Bytes(&mut buf), 0, 5).unwrap();
    assert_eq!(buf, [50, 100, 50, 50, 100]);
}

#[test]
fn linear_view_saturates()
{
    let src = ints(&[-100, 0, 200]);
    let f = Func::Linear(LinearFunc::of_one(2.0, 50.0));
    let v = as_func_array(true, &f, ElementKind::U8, &[src]).unwrap();
    let got: Vec<i32> = (0..3).map(|i| v.get_int(i).unwrap()).collect();
    assert_eq!(got, vec![0, 50, 255]);
}

#[test]
fn abs_diff_wraps_through_i64()
{
    let a = ints(&[5, 2_000_000_000]);
    let b = ints(&[7, -1_000_000_000]);
    let v = as_func_array(false, &Func::AbsDiff, ElementKind::I32, &[a, b]).unwrap();
    assert_eq!(v.get_int(0).unwrap(), 2);
    // |2e9 - (-1e9)| = 3_000_000_000, wrapped into i32
    assert_eq!(v.get_int(1).unwrap(), -1_294_967_296);

    let mut buf = [0i32; 2];
    v.get_data(0, &mut DataDst::Ints(&mut buf), 0, 2).unwrap();
    assert_eq!(buf, [2, -1_294_967_296]);
}

#[test]
fn positive_diff_saturates_at_zero()
{
    let a = SimpleMemoryModel.from_bytes(&[10, 5]).clone_ref();
    let b = SimpleMemoryModel.from_bytes(&[3, 9]).clone_ref();
    let v = as_func_array(true, &Func::PositiveDiff, ElementKind::U8, &[a, b]).unwrap();
    assert_eq!(v.get_int(0).unwrap(), 7);
    assert_eq!(v.get_int(1).unwrap(), 0);
}

#[test]
fn bit_differences_are_boolean_algebra()
{
    let x = SimpleMemoryModel.from_bits(&[true, true, false, false]).clone_ref();
    let y = SimpleMemoryModel.from_bits(&[true, false, true, false]).clone_ref();

    let xor = as_func_array(true, &Func::AbsDiff, ElementKind::Bit, &[x.clone_ref(), y.clone_ref()]).unwrap();
    let and_not = as_func_array(true, &Func::PositiveDiff, ElementKind::Bit, &[x, y]).unwrap();
    let got: Vec<bool> = (0..4).map(|i| xor.get_bit(i).unwrap()).collect();
    assert_eq!(got, vec![false, true, true, false]);
    let got: Vec<bool> = (0..4).map(|i| and_not.get_bit(i).unwrap()).collect();
    assert_eq!(got, vec![false, true, false, false]);
}

#[test]
fn min_max_reduce_in_kind()
{
    let a = ints(&[1, 9, 5]);
    let b = ints(&[4, 2, 5]);
    let c = ints(&[3, 3, 3]);

    let inner = as_func_array(true, &Func::Min, ElementKind::I32, &[a, b]).unwrap();
    let outer = as_func_array(true, &Func::Min, ElementKind::I32, &[inner, c]).unwrap();
    let got: Vec<i32> = (0..3).map(|i| outer.get_int(i).unwrap()).collect();
    assert_eq!(got, vec![1, 2, 3]);

    let hi = as_func_array(
        true,
        &Func::Max,
        ElementKind::I32,
        &[ints(&[1, 9, 5]), ints(&[4, 2, 5])],
    )
    .unwrap();
    let got: Vec<i32> = (0..3).map(|i| hi.get_int(i).unwrap()).collect();
    assert_eq!(got, vec![4, 9, 5]);

    let bits_lo = as_func_array(
        true,
        &Func::Min,
        ElementKind::Bit,
        &[
            SimpleMemoryModel.from_bits(&[true, true, false]).clone_ref(),
            SimpleMemoryModel.from_bits(&[true, false, false]).clone_ref(),
        ],
    )
    .unwrap();
    let got: Vec<bool> = (0..3).map(|i| bits_lo.get_bit(i).unwrap()).collect();
    assert_eq!(got, vec![true, false, false]);
}

#[test]
fn zero_argument_minmax_is_rejected()
{
    let r = as_func_array(true, &Func::Min, ElementKind::I32, &[]);
    assert_eq!(r.unwrap_err().kind(), ErrorKind::InvalidArgument);
}

#[test]
fn mismatched_lengths_are_rejected()
{
    let r = as_func_array(true, &Func::Min, ElementKind::I32, &[ints(&[1, 2]), ints(&[1])]);
    assert_eq!(r.unwrap_err().kind(), ErrorKind::SizeMismatch);
}

#[test]
fn constants_collapse_to_n_copies()
{
    let src = ints(&[0; 7]);
    let v = as_func_array(true, &Func::Constant(300.0), ElementKind::U8, &[src.clone_ref()]).unwrap();
    assert_eq!(v.len(), 7);
    assert_eq!(v.get_int(6).unwrap(), 255);

    let wrapped = as_func_array(false, &Func::Constant(300.0), ElementKind::U8, &[src]).unwrap();
    assert_eq!(wrapped.get_int(0).unwrap(), 44);

    let direct = n_copies(ElementKind::I32, 4, -3.0, true);
    assert_eq!(direct.index_of(0, 4, -3.0), 0);
    assert_eq!(direct.last_index_of(0, 4, -3.0), 3);
}

#[test]
fn identity_round_trips()
{
    let src = ints(&[-5, 0, 7]);
    let v = as_func_array(true, &Func::Identity, ElementKind::I32, &[src.clone_ref()]).unwrap();
    for i in 0..3 {
        assert_eq!(v.get_int(i).unwrap(), src.get_int(i).unwrap());
    }
    assert!(v.flags().immutable);
}

#[test]
fn conversion_views_narrow_per_policy()
{
    let src = ints(&[-5, 300, 90000]);
    let sat = as_func_array(true, &Func::Identity, ElementKind::U8, &[src.clone_ref()]).unwrap();
    let got: Vec<i32> = (0..3).map(|i| sat.get_int(i).unwrap()).collect();
    assert_eq!(got, vec![0, 255, 255]);

    let wrap = as_func_array(false, &Func::Identity, ElementKind::U8, &[src]).unwrap();
    let got: Vec<i32> = (0..3).map(|i| wrap.get_int(i).unwrap()).collect();
    assert_eq!(got, vec![251, 44, 90000 & 0xFF]);
}

#[test]
fn float_to_int_narrowing_uses_the_long_pivot()
{
    let src = SimpleMemoryModel.from_doubles(&[1e19, -1e19, 3.9, f64::NAN]).clone_ref();
    let wrap = as_func_array(false, &Func::Identity, ElementKind::I32, &[src.clone_ref()]).unwrap();
    assert_eq!(wrap.get_int(0).unwrap(), i64::MAX as i32);
    assert_eq!(wrap.get_int(1).unwrap(), i64::MIN as i32);
    assert_eq!(wrap.get_int(2).unwrap(), 3);
    assert_eq!(wrap.get_int(3).unwrap(), 0);

    let sat = as_func_array(true, &Func::Identity, ElementKind::I32, &[src]).unwrap();
    assert_eq!(sat.get_int(0).unwrap(), i32::MAX);
    assert_eq!(sat.get_int(1).unwrap(), i32::MIN);
}

#[test]
fn any_func_views_narrow_their_results()
{
    let a = SimpleMemoryModel.from_doubles(&[1.0, 4.0, 9.0]).clone_ref();
    let b = SimpleMemoryModel.from_doubles(&[1.0, 1.0, 1.0]).clone_ref();
    let f = Func::any_fn(|args: &[f64]| (args[0] + args[1]).sqrt());
    let v = as_func_array(true, &f, ElementKind::F64, &[a, b]).unwrap();
    assert_eq!(v.get_double(1).unwrap(), 5f64.sqrt());

    let rounded = {
        let a = SimpleMemoryModel.from_doubles(&[1.0, 4.0, 9.0]).clone_ref();
        let b = SimpleMemoryModel.from_doubles(&[1.0, 1.0, 1.0]).clone_ref();
        as_func_array(
            true,
            &Func::any_fn(|args: &[f64]| (args[0] + args[1]).sqrt()),
            ElementKind::I32,
            &[a, b],
        )
        .unwrap()
    };
    // (i64)sqrt truncates toward zero
    let got: Vec<i32> = (0..3).map(|i| rounded.get_int(i).unwrap()).collect();
    assert_eq!(got, vec![1, 2, 3]);
}

#[test]
fn bulk_reads_match_scalar_reads_for_every_specialization()
{
    let a = ints(&[-3, 0, 7, 100, -100, 55, 2, 9]);
    let b = ints(&[5, 5, 5, 5, 5, 5, 5, 5]);
    let views: Vec<ArrRef> = vec![
        as_func_array(true, &Func::Linear(LinearFunc::new(&[3.0, -2.0], 1.0)), ElementKind::I32,
                      &[a.clone_ref(), b.clone_ref()]).unwrap(),
        as_func_array(true, &Func::Linear(LinearFunc::new(&[0.5, 0.5], 0.0)), ElementKind::F64,
                      &[a.clone_ref(), b.clone_ref()]).unwrap(),
        as_func_array(true, &Func::Min, ElementKind::I32, &[a.clone_ref(), b.clone_ref()]).unwrap(),
        as_func_array(false, &Func::AbsDiff, ElementKind::I32, &[a.clone_ref(), b.clone_ref()]).unwrap(),
        as_func_array(true, &Func::PositiveDiff, ElementKind::I32, &[a.clone_ref(), b.clone_ref()]).unwrap(),
        as_func_array(true, &Func::any_fn(|x: &[f64]| x[0] * x[1] - 1.0), ElementKind::I32,
                      &[a.clone_ref(), b.clone_ref()]).unwrap(),
        as_func_array(true, &Func::Identity, ElementKind::U16, &[a.clone_ref()]).unwrap(),
    ];
    for v in views {
        match v.kind() {
            ElementKind::F64 => {
                let mut buf = vec![0f64; v.len() as usize];
                v.get_data(0, &mut DataDst::Doubles(&mut buf), 0, buf.len()).unwrap();
                let scalar: Vec<f64> = (0..v.len()).map(|i| v.get_double(i).unwrap()).collect();
                for (bulk, one) in buf.iter().zip_eq(scalar.iter()) {
                    assert_eq!(bulk, one);
                }
            }
            ElementKind::U16 => {
                let mut buf = vec![0u16; v.len() as usize];
                v.get_data(0, &mut DataDst::Shorts(&mut buf), 0, buf.len()).unwrap();
                for (i, &bulk) in buf.iter().enumerate() {
                    assert_eq!(bulk as i32, v.get_int(i as u64).unwrap());
                }
            }
            _ => {
                let mut buf = vec![0i32; v.len() as usize];
                v.get_data(0, &mut DataDst::Ints(&mut buf), 0, buf.len()).unwrap();
                let scalar: Vec<i32> = (0..v.len()).map(|i| v.get_int(i).unwrap()).collect();
                assert_eq!(buf, scalar);
            }
        }
    }
}

#[test]
fn shifted_sources_split_at_the_wrap_boundary()
{
    let base = ints(&[0, 1, 2, 3, 4]);
    let shifted = lazyarray::as_shifted(&base, 2);
    let got: Vec<i32> = (0..5).map(|i| shifted.get_int(i).unwrap()).collect();
    assert_eq!(got, vec![3, 4, 0, 1, 2]);

    let mut buf = [0i32; 5];
    shifted.get_data(0, &mut DataDst::Ints(&mut buf), 0, 5).unwrap();
    assert_eq!(buf, [3, 4, 0, 1, 2]);

    let back = lazyarray::as_shifted(&shifted, -2);
    for i in 0..5 {
        assert_eq!(back.get_int(i).unwrap(), base.get_int(i).unwrap());
    }
}

#[test]
fn coord_func_matrices_decode_row_major_coordinates()
{
    use lazyarray::{as_coord_func_matrix, CoordFunc};

    let f = CoordFunc::Math(Func::any_fn(|c: &[f64]| c[0] + 10.0 * c[1]));
    let m = as_coord_func_matrix(true, &f, ElementKind::I32, &[3, 2]).unwrap();
    assert_eq!(m.dims(), &[3, 2]);
    let got: Vec<i32> = (0..6).map(|i| m.array().get_int(i).unwrap()).collect();
    assert_eq!(got, vec![0, 1, 2, 10, 11, 12]);

    let mut buf = [0i32; 6];
    m.array().get_data(0, &mut DataDst::Ints(&mut buf), 0, 6).unwrap();
    assert_eq!(buf, [0, 1, 2, 10, 11, 12]);
}

#[test]
fn interpolation_of_a_matching_matrix_returns_its_array()
{
    use lazyarray::{as_coord_func_matrix, ContinuationMode, CoordFunc, Matrix};

    let base = Matrix::new(ints(&[1, 2, 3, 4]), &[2, 2]).unwrap();
    let f = CoordFunc::Interpolation {
        matrix: base.clone(),
        continuation: ContinuationMode::Constant(0.0),
    };

    let same = as_coord_func_matrix(true, &f, ElementKind::I32, &[2, 2]).unwrap();
    assert!(same.array().flags().immutable);
    for i in 0..4 {
        assert_eq!(same.array().get_int(i).unwrap(), base.array().get_int(i).unwrap());
    }

    // a different shape re-slices through the continuation
    let wider = as_coord_func_matrix(true, &f, ElementKind::I32, &[3, 2]).unwrap();
    let got: Vec<i32> = (0..6).map(|i| wider.array().get_int(i).unwrap()).collect();
    assert_eq!(got, vec![1, 2, 0, 3, 4, 0]);
}
