use lazyarray::{
    as_updatable_func_array, Array, ArrayError, ElementKind, ErrorKind, LinearFunc, MathFunc,
    SimpleMemoryModel, UpdFunc, UpdatableArray, UpdatableMathFunc,
};

fn err_kind<T>(r: Result<T, ArrayError>) -> ErrorKind
{
    match r {
        Ok(_) => panic!("expected an error"),
        Err(e) => e.kind(),
    }
}

#[test]
fn invertible_linear_views_round_trip()
{
    let x = SimpleMemoryModel.new_array(ElementKind::F64, 4).unwrap();
    let f = UpdFunc::Linear(LinearFunc::of_one(2.0, 50.0));
    let v = as_updatable_func_array(true, &f, ElementKind::F64, &[x.clone_upd()]).unwrap();

    v.set_double(0, 60.0).unwrap();
    assert_eq!(x.get_double(0).unwrap(), 5.0);
    assert_eq!(v.get_double(0).unwrap(), 60.0);

    v.set_double(3, -10.0).unwrap();
    assert_eq!(x.get_double(3).unwrap(), -30.0);
    assert_eq!(v.get_double(3).unwrap(), -10.0);
}

#[test]
fn identity_views_narrow_on_both_sides()
{
    let x = SimpleMemoryModel.new_array(ElementKind::I32, 2).unwrap();
    let v = as_updatable_func_array(true, &UpdFunc::Identity, ElementKind::U8, &[x.clone_upd()]).unwrap();
    // the view kind narrows the written value, then the store-back clamps
    // into the source's range
    v.set_double(0, 300.0).unwrap();
    assert_eq!(x.get_int(0).unwrap(), 255);
    assert_eq!(v.get_int(0).unwrap(), 255);
}

#[test]
fn bounded_sources_clamp_on_store_back()
{
    let x = SimpleMemoryModel.new_array(ElementKind::U8, 1).unwrap();
    let v = as_updatable_func_array(true, &UpdFunc::Identity, ElementKind::F64, &[x.clone_upd()]).unwrap();
    v.set_double(0, 300.0).unwrap();
    assert_eq!(x.get_int(0).unwrap(), 255);

    let wrapping = as_updatable_func_array(false, &UpdFunc::Identity, ElementKind::F64, &[x.clone_upd()]).unwrap();
    wrapping.set_double(0, 300.0).unwrap();
    assert_eq!(x.get_int(0).unwrap(), 44);
}

#[test]
fn long_sources_keep_64_bit_precision()
{
    let x = SimpleMemoryModel.new_array(ElementKind::I64, 1).unwrap();
    let v = as_updatable_func_array(true, &UpdFunc::Identity, ElementKind::F64, &[x.clone_upd()]).unwrap();
    let big = (1i64) << 60;
    v.set_double(0, big as f64).unwrap();
    assert_eq!(x.get_long(0).unwrap(), big);
}

struct Negation;

impl MathFunc for Negation
{
    fn get(&self, args: &[f64]) -> f64
    {
        1.0 - args[0]
    }
}

impl UpdatableMathFunc for Negation
{
    fn set(&self, args: &mut [f64], new_result: f64)
    {
        args[0] = 1.0 - new_result;
    }
}

#[test]
fn bit_destinations_use_precomputed_back_args()
{
    let x = SimpleMemoryModel.new_array(ElementKind::Bit, 3).unwrap();
    let v = as_updatable_func_array(true, &UpdFunc::any(Negation), ElementKind::Bit, &[x.clone_upd()]).unwrap();

    // the view negates: fresh zeros read back as ones
    assert!(v.get_bit(0).unwrap());

    v.set_bit(0, true).unwrap();
    assert!(!x.get_bit(0).unwrap());
    assert!(v.get_bit(0).unwrap());

    v.set_bit(1, false).unwrap();
    assert!(x.get_bit(1).unwrap());
    assert!(!v.get_bit(1).unwrap());
}

struct PlusTimes;

impl MathFunc for PlusTimes
{
    fn get(&self, args: &[f64]) -> f64
    {
        args[0] + 2.0 * args[1]
    }
}

impl UpdatableMathFunc for PlusTimes
{
    // pushes the whole change into the first argument
    fn set(&self, args: &mut [f64], new_result: f64)
    {
        args[0] = new_result - 2.0 * args[1];
    }
}

#[test]
fn multi_argument_views_write_back_through_set()
{
    let a = SimpleMemoryModel.new_array(ElementKind::F64, 2).unwrap();
    let b = SimpleMemoryModel.from_doubles(&[10.0, 20.0]);
    let v = as_updatable_func_array(
        true,
        &UpdFunc::any(PlusTimes),
        ElementKind::F64,
        &[a.clone_upd(), b.clone_upd()],
    )
    .unwrap();

    assert_eq!(v.get_double(0).unwrap(), 20.0);
    v.set_double(0, 23.0).unwrap();
    assert_eq!(a.get_double(0).unwrap(), 3.0);
    assert_eq!(b.get_double(0).unwrap(), 10.0);
    assert_eq!(v.get_double(0).unwrap(), 23.0);
}

#[test]
fn immutable_projections_keep_read_semantics()
{
    let x = SimpleMemoryModel.from_ints(&[5, 6]);
    let f = UpdFunc::Linear(LinearFunc::of_one(3.0, 0.0));
    let v = as_updatable_func_array(true, &f, ElementKind::I32, &[x.clone_upd()]).unwrap();
    let frozen = v.as_immutable();
    assert_eq!(frozen.get_int(0).unwrap(), v.get_int(0).unwrap());
    assert_eq!(err_kind(frozen.to_updatable()), ErrorKind::UnallowedMutation);

    x.set_int(0, 7).unwrap();
    assert_eq!(frozen.get_int(0).unwrap(), 21);
}

#[test]
fn degenerate_updatable_constructions_are_rejected()
{
    let x = SimpleMemoryModel.new_array(ElementKind::I32, 2).unwrap();
    let zero = UpdFunc::Linear(LinearFunc::of_one(0.0, 1.0));
    assert_eq!(
        err_kind(as_updatable_func_array(true, &zero, ElementKind::I32, &[x.clone_upd()])),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        err_kind(as_updatable_func_array(true, &UpdFunc::Identity, ElementKind::I32, &[])),
        ErrorKind::InvalidArgument
    );
}
