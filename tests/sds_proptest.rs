// Sds property tests.
//
// Property: an Sds driven by random append/resize/reserve/clear/set
// operations always matches a Vec<u8> model.
//  - Content and len() equal the model after every op.
//  - len() + avail() == capacity(), and the terminator follows the content.
//  - Shrinking ops (clear, resize down) never reduce capacity().
//  - Out-of-range get() fails exactly when the model index is out of range.
//
// Property: ordering agrees with Vec<u8> ordering.
use kvdict::Sds;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Append(Vec<u8>),
    Resize(usize),
    Reserve(usize),
    Clear,
    Set(usize, u8),
    Get(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => proptest::collection::vec(any::<u8>(), 0..40).prop_map(Op::Append),
        1 => (0usize..200).prop_map(Op::Resize),
        1 => (0usize..300).prop_map(Op::Reserve),
        1 => Just(Op::Clear),
        2 => (0usize..100, any::<u8>()).prop_map(|(i, b)| Op::Set(i, b)),
        2 => (0usize..100).prop_map(Op::Get),
    ]
}

proptest! {
    #[test]
    fn prop_sds_matches_vec_model(ops in proptest::collection::vec(arb_op(), 1..80)) {
        let mut sut = Sds::new();
        let mut model: Vec<u8> = Vec::new();

        for op in ops {
            let cap_before = sut.capacity();
            match op {
                Op::Append(bytes) => {
                    sut.append(&bytes);
                    model.extend_from_slice(&bytes);
                }
                Op::Resize(n) => {
                    let shrinking = n <= model.len();
                    sut.resize(n);
                    if shrinking {
                        model.truncate(n);
                        prop_assert_eq!(sut.capacity(), cap_before);
                    } else {
                        // Grown region is placeholder content; write it.
                        let old = model.len();
                        model.resize(n, 0xAA);
                        sut.as_bytes_mut()[old..].fill(0xAA);
                    }
                }
                Op::Reserve(n) => {
                    sut.reserve(n);
                    prop_assert!(sut.capacity() >= n);
                    prop_assert_eq!(sut.capacity(), cap_before.max(n));
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                    prop_assert_eq!(sut.capacity(), cap_before);
                }
                Op::Set(i, b) => {
                    let res = sut.get_mut(i).map(|slot| *slot = b);
                    prop_assert_eq!(res.is_ok(), i < model.len());
                    if let Some(m) = model.get_mut(i) {
                        *m = b;
                    }
                }
                Op::Get(i) => {
                    prop_assert_eq!(sut.get(i).ok(), model.get(i).copied());
                }
            }

            prop_assert_eq!(sut.as_bytes(), &model[..]);
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.len() + sut.avail(), sut.capacity());
            prop_assert_eq!(sut.as_bytes_with_nul().last(), Some(&0u8));
        }
    }

    #[test]
    fn prop_sds_order_matches_bytes(
        a in proptest::collection::vec(any::<u8>(), 0..12),
        b in proptest::collection::vec(any::<u8>(), 0..12),
    ) {
        let (sa, sb) = (Sds::from(a.as_slice()), Sds::from(b.as_slice()));
        prop_assert_eq!(sa.cmp(&sb), a.cmp(&b));
        prop_assert_eq!(sa == sb, a == b);
    }
}
