use pnacl_ir::{
    ArithFlags, CallAttr, CallAttrs, CallConv, ConstExpr, GlobalRef, GlobalVariableData,
    InstData, InstDetail, IntrinsicId, Linkage, MdKind, MdNode, MemAccess, Module, Opcode,
    Signature, Type, builder::test_util::TestModuleBuilder,
};
use pnacl_verifier::{
    ErrorReporter, Reason, VerificationReport, VerifierConfig, ViolationKind, run_on_function,
    verify_function, verify_module,
};

fn verify(module: &Module) -> VerificationReport {
    verify_module(module, &VerifierConfig::default())
}

fn reasons(report: &VerificationReport) -> Vec<Reason> {
    report.reasons().collect()
}

fn diagnostic_fingerprint(report: &VerificationReport) -> Vec<String> {
    report
        .diagnostics
        .iter()
        .map(|diagnostic| {
            format!(
                "{}|{}|{}",
                diagnostic.code(),
                diagnostic.primary,
                diagnostic.message
            )
        })
        .collect()
}

/// A function that allocates a stack slot and casts it to `*i32`.
fn with_i32_slot(
    mb: &mut TestModuleBuilder,
    body: impl FnOnce(&mut pnacl_ir::FunctionBuilder<'_>, pnacl_ir::ValueId),
) {
    let i32_ptr = mb.module_builder().ptr_type(Type::I32);
    let mut builder = mb.func_builder(&[Type::I32], Type::Void);
    let size = builder.make_imm_value(4i32);
    let slot = builder.alloca(Type::I8, size, 4);
    let ptr = builder.cast(Opcode::BitCast, slot, i32_ptr);
    body(&mut builder, ptr);
    builder.ret(None);
    builder.finish().unwrap();
}

#[test]
fn void_return_is_clean() {
    let mut mb = TestModuleBuilder::new();
    let mut builder = mb.func_builder(&[], Type::Void);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert!(report.is_ok(), "expected no violations, got {report}");
    assert_eq!(report.to_string(), "verification succeeded");
}

#[test]
fn banned_and_unknown_opcodes() {
    let banned = [
        Opcode::GetElementPtr,
        Opcode::VaArg,
        Opcode::Invoke,
        Opcode::LandingPad,
        Opcode::Resume,
        Opcode::IndirectBr,
        Opcode::ShuffleVector,
        Opcode::ExtractValue,
        Opcode::InsertValue,
        Opcode::AtomicCmpXchg,
        Opcode::AtomicRmw,
        Opcode::Fence,
    ];
    let unknown = [Opcode::AddrSpaceCast, Opcode::UserOp1, Opcode::UserOp2];

    let expectations = banned
        .iter()
        .map(|op| (*op, Reason::BannedOpcode))
        .chain(unknown.iter().map(|op| (*op, Reason::UnknownOpcode)));

    for (opcode, expected) in expectations {
        let mut mb = TestModuleBuilder::new();
        let mut builder = mb.func_builder(&[Type::I32], Type::Void);
        let arg = builder.args()[0];
        builder.insert_inst(InstData::new(opcode, &[arg], Type::Void));
        builder.ret(None);
        builder.finish().unwrap();

        let report = verify(&mb.build());
        assert_eq!(reasons(&report), [expected], "{opcode}");
        assert_eq!(report.diagnostics[0].kind(), ViolationKind::Structural);
    }
}

#[test]
fn address_computation_is_banned() {
    let mut mb = TestModuleBuilder::new();
    let i8_ptr = mb.module_builder().ptr_type(Type::I8);
    let mut builder = mb.func_builder(&[], Type::Void);
    let size = builder.make_imm_value(8i32);
    let slot = builder.alloca(Type::I8, size, 1);
    let offset = builder.make_imm_value(1i32);
    builder.insert_inst(InstData::new(Opcode::GetElementPtr, &[slot, offset], i8_ptr));
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(reasons(&report), [Reason::BannedOpcode]);
    assert_eq!(
        report.diagnostics[0].message,
        "Function test_func disallowed: bad instruction opcode: v3.*i8 = getelementptr v1 1.i32;"
    );
}

#[test]
fn i1_allowed_only_as_logic_value() {
    let mut mb = TestModuleBuilder::new();
    let mut builder = mb.func_builder(&[Type::I1, Type::I32], Type::Void);
    let (flag, x) = (builder.args()[0], builder.args()[1]);
    let entry = builder.append_block();
    let then = builder.append_block();
    let join = builder.append_block();

    builder.switch_to_block(entry);
    let both = builder.binary(Opcode::And, flag, flag);
    let cmp = builder.icmp(x, x);
    builder.select(cmp, x, x);
    builder.br(cmp, then, join);

    builder.switch_to_block(then);
    builder.jump(join);

    builder.switch_to_block(join);
    builder.phi(Type::I1, &[(cmp, entry), (both, then)]);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert!(report.is_ok(), "{report}");
}

#[test]
fn i1_arithmetic_is_rejected() {
    let mut mb = TestModuleBuilder::new();
    let v4i1 = mb.module_builder().vector_type(Type::I1, 4);
    let mut builder = mb.func_builder(&[Type::I1, Type::F32, v4i1], Type::Void);
    let (flag, float, flags) = (builder.args()[0], builder.args()[1], builder.args()[2]);
    builder.binary(Opcode::Add, flag, flag);
    builder.binary(Opcode::Shl, flags, flags);
    builder.icmp(flag, flag);
    builder.binary(Opcode::Mul, float, float);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(
        reasons(&report),
        [
            Reason::InvalidIntArithmeticType,
            Reason::InvalidIntArithmeticType,
            Reason::InvalidIntArithmeticType,
            Reason::ExpectsIntArithmeticType,
        ]
    );
}

#[test]
fn load_through_i1_pointer() {
    let mut mb = TestModuleBuilder::new();
    let i1_ptr = mb.module_builder().ptr_type(Type::I1);
    let mut builder = mb.func_builder(&[], Type::Void);
    let size = builder.make_imm_value(4i32);
    let slot = builder.alloca(Type::I8, size, 1);
    let cast = builder.cast(Opcode::BitCast, slot, i1_ptr);
    builder.load(cast, Type::I1, MemAccess::aligned(1));
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    insta::assert_snapshot!(report.to_string(), @r"
    Function test_func disallowed: bad result type: *i1 v2.*i1 = bitcast v1;
    Function test_func disallowed: bad pointer: v3.i1 = load v2, align 1;
    ");
    assert_eq!(report.diagnostics[0].context.type_name.as_deref(), Some("*i1"));
}

#[test]
fn pointer_operands_must_be_normalized() {
    let mut mb = TestModuleBuilder::new();
    let i32_ptr = mb.module_builder().ptr_type(Type::I32);
    let mut builder = mb.func_builder(&[Type::I32], Type::Void);
    let null = builder.make_null_value(i32_ptr);
    let undef = builder.make_undef_value(i32_ptr);
    builder.load(null, Type::I32, MemAccess::aligned(1));
    let value = builder.args()[0];
    builder.store(value, undef, MemAccess::aligned(1));
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(reasons(&report), [Reason::BadPointer, Reason::BadPointer]);
    assert!(
        report
            .diagnostics
            .iter()
            .all(|diag| diag.kind() == ViolationKind::Provenance)
    );
}

#[test]
fn memory_access_rules() {
    let mut mb = TestModuleBuilder::new();
    with_i32_slot(&mut mb, |builder, ptr| {
        let value = builder.args()[0];
        builder.load(ptr, Type::I32, MemAccess::aligned(1));
        builder.store(value, ptr, MemAccess::aligned(1));

        builder.load(ptr, Type::I32, MemAccess::aligned(4));
        builder.load(
            ptr,
            Type::I32,
            MemAccess {
                align: 1,
                volatile: true,
                atomic: false,
            },
        );
        builder.store(
            value,
            ptr,
            MemAccess {
                align: 1,
                volatile: false,
                atomic: true,
            },
        );
        builder.store(value, ptr, MemAccess::aligned(0));
    });

    let report = verify(&mb.build());
    assert_eq!(
        reasons(&report),
        [
            Reason::BadAlignment,
            Reason::VolatileLoad,
            Reason::AtomicStore,
            Reason::BadAlignment,
        ]
    );
}

#[test]
fn pointer_int_casts_are_i32() {
    let mut mb = TestModuleBuilder::new();
    let i32_ptr = mb.module_builder().ptr_type(Type::I32);
    let mut builder = mb.func_builder(&[Type::I32, Type::I64], Type::Void);
    let (narrow, wide) = (builder.args()[0], builder.args()[1]);
    let size = builder.make_imm_value(4i32);
    let slot = builder.alloca(Type::I8, size, 1);

    let from_int = builder.cast(Opcode::IntToPtr, narrow, i32_ptr);
    builder.cast(Opcode::PtrToInt, slot, Type::I32);

    builder.cast(Opcode::IntToPtr, wide, i32_ptr);
    builder.cast(Opcode::PtrToInt, slot, Type::I64);
    builder.cast(Opcode::PtrToInt, from_int, Type::I32);
    builder.cast(Opcode::BitCast, from_int, i32_ptr);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(
        reasons(&report),
        [
            Reason::NonI32IntToPtr,
            Reason::NonI32PtrToInt,
            Reason::OperandNotInherentPtr,
            Reason::OperandNotInherentPtr,
        ]
    );
}

#[test]
fn alloca_rules() {
    let mut mb = TestModuleBuilder::new();
    let mut builder = mb.func_builder(&[], Type::Void);
    let size32 = builder.make_imm_value(4i32);
    let size64 = builder.make_imm_value(4i64);
    builder.alloca(Type::I8, size32, 1);
    builder.alloca(Type::I32, size32, 4);
    builder.alloca(Type::I8, size64, 1);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(
        reasons(&report),
        [Reason::NonI8Alloca, Reason::AllocaSizeNotI32]
    );
}

#[test]
fn vector_index_rules() {
    let mut mb = TestModuleBuilder::new();
    let v4i32 = mb.module_builder().vector_type(Type::I32, 4);
    let mut builder = mb.func_builder(&[v4i32, Type::I32], Type::Void);
    let (vec, idx) = (builder.args()[0], builder.args()[1]);
    let three = builder.make_imm_value(3i32);
    let four = builder.make_imm_value(4i32);

    builder.extract_element(vec, three);
    let elem = builder.extract_element(vec, idx);
    builder.extract_element(vec, four);
    builder.insert_element(vec, elem, three);
    builder.insert_element(vec, elem, four);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(
        reasons(&report),
        [
            Reason::NonConstantVectorIndex,
            Reason::OutOfRangeVectorIndex,
            Reason::OutOfRangeVectorIndex,
        ]
    );
    assert_eq!(
        report.diagnostics[0].message,
        "Function test_func disallowed: non-constant vector insert/extract index: v5.i32 = extractelement v0 v1;"
    );
}

#[test]
fn constant_vectors_are_rejected() {
    let mut mb = TestModuleBuilder::new();
    let v4i32 = mb.module_builder().vector_type(Type::I32, 4);
    let v4i1 = mb.module_builder().vector_type(Type::I1, 4);
    let mut builder = mb.func_builder(&[v4i32, v4i1], Type::Void);
    let (arg, mask) = (builder.args()[0], builder.args()[1]);
    let splat = builder.make_const_vector(&[pnacl_ir::Immediate::I32(1); 4], v4i32);
    let undef = builder.make_undef_value(v4i32);
    builder.binary(Opcode::And, arg, undef);
    builder.binary(Opcode::And, arg, splat);
    builder.select(mask, splat, arg);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(reasons(&report), [Reason::BadOperand, Reason::BadOperand]);
}

#[test]
fn int_arithmetic_operands_skip_generic_pass() {
    let mut mb = TestModuleBuilder::new();
    let gv = mb
        .module_builder()
        .make_global(GlobalVariableData::new("g", Type::I32, Linkage::Private))
        .unwrap();
    let v4i32 = mb.module_builder().vector_type(Type::I32, 4);
    let mut builder = mb.func_builder(&[Type::I32, v4i32], Type::Void);
    let (x, vec) = (builder.args()[0], builder.args()[1]);
    let addr = builder.make_const_expr(ConstExpr::PtrToInt(GlobalRef::Var(gv)), Type::I32);
    let splat = builder.make_const_vector(&[pnacl_ir::Immediate::I32(1); 4], v4i32);
    builder.binary(Opcode::Add, x, addr);
    builder.binary(Opcode::Add, vec, splat);
    builder.icmp(x, addr);
    builder.binary_with_flags(Opcode::Shl, x, addr, ArithFlags::NSW);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(reasons(&report), [Reason::HasNsw]);
    assert_eq!(
        report.diagnostics[0].message,
        "Function test_func disallowed: has \"nsw\" attribute: v7.i32 = shl nsw v0 ptrtoint(%g).i32;"
    );
}

#[test]
fn expected_type_notes() {
    let mut mb = TestModuleBuilder::new();
    let i32_ptr = mb.module_builder().ptr_type(Type::I32);
    let mut builder = mb.func_builder(&[Type::I1, Type::I64], Type::Void);
    let (flag, wide) = (builder.args()[0], builder.args()[1]);
    let entry = builder.append_block();
    let exit = builder.append_block();

    builder.switch_to_block(entry);
    builder.binary(Opcode::Add, flag, flag);
    builder.cast(Opcode::IntToPtr, wide, i32_ptr);
    builder.alloca(Type::I8, wide, 1);
    builder.switch(flag, exit, &[]);

    builder.switch_to_block(exit);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    let notes: Vec<_> = report
        .diagnostics
        .iter()
        .map(|diag| (diag.reason, diag.notes[0].message.as_str()))
        .collect();
    assert_eq!(
        notes,
        [
            (
                Reason::InvalidIntArithmeticType,
                "expected i8, i16, i32, i64 or a vector of them"
            ),
            (Reason::NonI32IntToPtr, "expected i32 source operand"),
            (Reason::AllocaSizeNotI32, "expected i32 array size"),
            (Reason::SwitchOnI1, "expected i8, i16, i32 or i64 condition"),
        ]
    );
    insta::assert_snapshot!(report.diagnostics[3].to_string(), @r"
    Function test_func disallowed: switch on i1: switch v0 block1;
      note: expected i8, i16, i32 or i64 condition
    ");
}

#[test]
fn i128_results_are_rejected() {
    let mut mb = TestModuleBuilder::new();
    let mut builder = mb.func_builder(&[Type::I64], Type::Void);
    let arg = builder.args()[0];
    builder.cast(Opcode::ZExt, arg, Type::I128);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(reasons(&report), [Reason::BadResultType]);
    assert_eq!(
        report.diagnostics[0].to_string(),
        "Function test_func disallowed: bad result type: i128 v1.i128 = zext v0;"
    );
}

#[test]
fn arithmetic_flags_are_banned() {
    let mut mb = TestModuleBuilder::new();
    let mut builder = mb.func_builder(&[Type::I32], Type::Void);
    let arg = builder.args()[0];
    builder.binary_with_flags(Opcode::Add, arg, arg, ArithFlags::NUW);
    builder.binary_with_flags(Opcode::Sub, arg, arg, ArithFlags::NSW);
    builder.binary_with_flags(Opcode::UDiv, arg, arg, ArithFlags::EXACT);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(
        reasons(&report),
        [Reason::HasNuw, Reason::HasNsw, Reason::HasExact]
    );
}

#[test]
fn missing_operand() {
    let mut mb = TestModuleBuilder::new();
    let mut builder = mb.func_builder(&[], Type::Void);
    builder.insert_inst(
        InstData::new(Opcode::Load, &[], Type::I32)
            .with_detail(InstDetail::Mem(MemAccess::aligned(1))),
    );
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(reasons(&report), [Reason::MissingOperand]);
}

#[test]
fn switch_rules() {
    let mut mb = TestModuleBuilder::new();
    let mut builder = mb.func_builder(&[Type::I32, Type::I1], Type::Void);
    let (x, flag) = (builder.args()[0], builder.args()[1]);
    let entry = builder.append_block();
    let a = builder.append_block();
    let b = builder.append_block();
    let c = builder.append_block();
    let d = builder.append_block();

    builder.switch_to_block(entry);
    let one = builder.make_imm_value(1i32);
    builder.switch(x, a, &[(one, b)]);

    builder.switch_to_block(a);
    let t = builder.make_imm_value(true);
    builder.switch(flag, b, &[(t, c)]);

    builder.switch_to_block(b);
    let i128_undef = builder.make_undef_value(Type::I128);
    builder.switch(x, c, &[(i128_undef, d)]);

    builder.switch_to_block(c);
    builder.switch(i128_undef, d, &[]);

    builder.switch_to_block(d);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(
        reasons(&report),
        [
            Reason::SwitchOnI1,
            Reason::BadSwitchCase,
            Reason::BadSwitchCondition,
        ]
    );
}

fn atomic_load_with_order(order: i32) -> VerificationReport {
    let mut mb = TestModuleBuilder::new();
    let i32_ptr = mb.module_builder().ptr_type(Type::I32);
    let atomic_load = mb.module_builder().declare_intrinsic(
        "llvm.nacl.atomic.load.i32",
        &[i32_ptr, Type::I32],
        Type::I32,
    );
    with_i32_slot(&mut mb, |builder, ptr| {
        let order = builder.make_imm_value(order);
        builder.call(atomic_load, &[ptr, order]);
    });
    verify(&mb.build())
}

#[test]
fn atomic_load_memory_order() {
    assert_eq!(
        reasons(&atomic_load_with_order(1)),
        [Reason::InvalidMemoryOrder]
    );
    assert!(atomic_load_with_order(6).is_ok());
    assert!(atomic_load_with_order(3).is_ok());
    assert_eq!(
        reasons(&atomic_load_with_order(4)),
        [Reason::InvalidMemoryOrder]
    );
    assert_eq!(
        reasons(&atomic_load_with_order(0)),
        [Reason::InvalidMemoryOrder]
    );
}

#[test]
fn atomic_order_must_be_constant() {
    let mut mb = TestModuleBuilder::new();
    let i32_ptr = mb.module_builder().ptr_type(Type::I32);
    let atomic_store = mb.module_builder().declare_intrinsic(
        "llvm.nacl.atomic.store.i32",
        &[Type::I32, i32_ptr, Type::I32],
        Type::Void,
    );
    with_i32_slot(&mut mb, |builder, ptr| {
        let order = builder.args()[0];
        builder.call(atomic_store, &[order, ptr, order]);
    });

    let report = verify(&mb.build());
    assert_eq!(reasons(&report), [Reason::InvalidMemoryOrder]);
}

#[test]
fn atomic_rmw_and_lock_free() {
    let mut mb = TestModuleBuilder::new();
    let i32_ptr = mb.module_builder().ptr_type(Type::I32);
    let rmw = mb.module_builder().declare_intrinsic(
        "llvm.nacl.atomic.rmw.i32",
        &[Type::I32, i32_ptr, Type::I32, Type::I32],
        Type::I32,
    );
    let lock_free = mb.module_builder().declare_intrinsic(
        "llvm.nacl.atomic.is.lock.free",
        &[Type::I32, i32_ptr],
        Type::I1,
    );
    with_i32_slot(&mut mb, |builder, ptr| {
        let value = builder.args()[0];
        let seq_cst = builder.make_imm_value(6i32);
        let add = builder.make_imm_value(1i32);
        let bad_op = builder.make_imm_value(9i32);
        let size = builder.make_imm_value(4i32);
        let odd_size = builder.make_imm_value(3i32);

        builder.call(rmw, &[add, ptr, value, seq_cst]);
        builder.call(rmw, &[bad_op, ptr, value, seq_cst]);
        builder.call(lock_free, &[size, ptr]);
        builder.call(lock_free, &[odd_size, ptr]);
    });

    let report = verify(&mb.build());
    assert_eq!(
        reasons(&report),
        [
            Reason::InvalidAtomicRmwOperation,
            Reason::InvalidLockFreeByteSize,
        ]
    );
}

#[test]
fn memory_intrinsics_need_unit_alignment() {
    let mut mb = TestModuleBuilder::new();
    let i8_ptr = mb.module_builder().ptr_type(Type::I8);
    let memcpy = mb.module_builder().declare_intrinsic(
        "llvm.memcpy.p0i8.p0i8.i32",
        &[i8_ptr, i8_ptr, Type::I32, Type::I32, Type::I1],
        Type::Void,
    );
    let mut builder = mb.func_builder(&[], Type::Void);
    let size = builder.make_imm_value(16i32);
    let dst = builder.alloca(Type::I8, size, 1);
    let src = builder.alloca(Type::I8, size, 1);
    let one = builder.make_imm_value(1i32);
    let four = builder.make_imm_value(4i32);
    let not_volatile = builder.make_imm_value(false);
    builder.call(memcpy, &[dst, src, size, one, not_volatile]);
    builder.call(memcpy, &[dst, src, size, four, not_volatile]);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(reasons(&report), [Reason::BadAlignment]);
}

#[test]
fn intrinsic_operands_and_allow_list() {
    let mut mb = TestModuleBuilder::new();
    let bswap = mb
        .module_builder()
        .declare_intrinsic("llvm.bswap.i32", &[Type::I32], Type::I32);
    let va_start = mb.module_builder().declare_intrinsic(
        &IntrinsicId::VaStart.to_string(),
        &[Type::I32],
        Type::Void,
    );
    let unknown = mb
        .module_builder()
        .declare_intrinsic("llvm.not.an.intrinsic", &[], Type::Void);
    let dbg_value = mb.module_builder().declare_intrinsic(
        "llvm.dbg.value",
        &[Type::Metadata, Type::I64, Type::Metadata],
        Type::Void,
    );
    let i32_ptr = mb.module_builder().ptr_type(Type::I32);

    let mut builder = mb.func_builder(&[Type::I32], Type::Void);
    let arg = builder.args()[0];
    let null = builder.make_null_value(i32_ptr);
    let node = builder.make_metadata_value(MdNode(0));
    let offset = builder.make_imm_value(0i64);

    builder.call(bswap, &[arg]);
    builder.call(bswap, &[null]);
    builder.call(va_start, &[arg]);
    builder.call(unknown, &[]);
    builder.call(dbg_value, &[node, offset, node]);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(
        reasons(&report),
        [
            Reason::BadIntrinsicOperand,
            Reason::DisallowedIntrinsic,
            Reason::DisallowedIntrinsic,
        ]
    );
}

#[test]
fn call_site_rules() {
    let mut mb = TestModuleBuilder::new();
    let callee = mb.module_builder().declare_function(Signature::new(
        "callee",
        Linkage::External,
        &[Type::I32],
        Type::I32,
    ));
    let narrow = mb.module_builder().declare_function(Signature::new(
        "narrow",
        Linkage::External,
        &[Type::I8],
        Type::Void,
    ));

    let mut builder = mb.func_builder(&[Type::I32], Type::Void);
    let arg = builder.args()[0];
    builder.call(callee, &[arg]);

    let callee_value = builder.make_func_value(callee);
    let with_attr = CallAttrs {
        attrs: [CallAttr::NoUnwind].into_iter().collect(),
        ..Default::default()
    };
    builder.call_indirect(callee_value, &[arg], Type::I32, with_attr);
    let fastcc = CallAttrs {
        cc: CallConv::Fast,
        ..Default::default()
    };
    builder.call_indirect(callee_value, &[arg], Type::I32, fastcc);

    let asm = builder.make_inline_asm("nop", Type::Void);
    builder.call_indirect(asm, &[], Type::Void, CallAttrs::default());

    builder.call_indirect(arg, &[arg], Type::I32, CallAttrs::default());

    let narrow_arg = builder.cast(Opcode::Trunc, arg, Type::I8);
    builder.call(narrow, &[narrow_arg]);
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(
        reasons(&report),
        [
            Reason::BadCallAttributes,
            Reason::BadCallingConvention,
            Reason::InlineAssembly,
            Reason::BadFunctionCallee,
            Reason::BadFunctionCallee,
        ]
    );
}

#[test]
fn metadata_whitelist() {
    let mut mb = TestModuleBuilder::new();
    let mut builder = mb.func_builder(&[], Type::Void);
    let inst = builder.unreachable();
    builder.set_metadata(inst, MdKind::DBG, MdNode(0));
    builder.set_metadata(inst, MdKind::TBAA, MdNode(1));
    builder.set_metadata(inst, MdKind(99), MdNode(2));
    builder.finish().unwrap();

    let report = verify(&mb.build());
    insta::assert_snapshot!(report.to_string(), @r"
    Function test_func has disallowed instruction metadata: !tbaa
    Function test_func has disallowed instruction metadata: !<unknown kind #99>
    ");
    assert!(
        report
            .diagnostics
            .iter()
            .all(|diag| diag.kind() == ViolationKind::Metadata)
    );
}

#[test]
fn metadata_is_checked_after_instruction_rule() {
    let mut mb = TestModuleBuilder::new();
    let mut builder = mb.func_builder(&[Type::I1], Type::Void);
    let flag = builder.args()[0];
    let sum = builder.binary(Opcode::Add, flag, flag);
    let inst = builder.func.dfg.value_inst(sum).unwrap();
    builder.set_metadata(inst, MdKind::PROF, MdNode(0));
    builder.ret(None);
    builder.finish().unwrap();

    let report = verify(&mb.build());
    assert_eq!(
        reasons(&report),
        [Reason::InvalidIntArithmeticType, Reason::DisallowedMetadata]
    );
}

fn two_bad_functions() -> Module {
    let mut mb = TestModuleBuilder::new();
    let first = mb.module_builder().declare_function(Signature::new(
        "first",
        Linkage::Public,
        &[Type::I1],
        Type::Void,
    ));
    let second = mb.module_builder().declare_function(Signature::new(
        "second",
        Linkage::Public,
        &[Type::I1],
        Type::Void,
    ));

    for func_ref in [second, first] {
        let mut builder = mb.module_builder().func_builder(func_ref);
        let flag = builder.args()[0];
        builder.binary(Opcode::Mul, flag, flag);
        builder.insert_inst(InstData::new(Opcode::Fence, &[], Type::Void));
        builder.ret(None);
        builder.finish().unwrap();
    }
    mb.build()
}

#[test]
fn module_report_is_ordered_and_capped() {
    let module = two_bad_functions();

    let report = verify(&module);
    let names: Vec<_> = report
        .diagnostics
        .iter()
        .map(|diag| diag.context.function_name.as_str())
        .collect();
    assert_eq!(names, ["first", "first", "second", "second"]);

    let capped = verify_module(&module, &VerifierConfig::default().with_max_diagnostics(3));
    assert_eq!(capped.len(), 3);
    assert_eq!(capped.diagnostics[..], report.diagnostics[..3]);
}

#[test]
fn reporter_threshold_and_reset() {
    let module = two_bad_functions();
    let cfg = VerifierConfig::default();
    let mut reporter = ErrorReporter::new(3);

    let mut funcs = module.funcs.iter();
    let (func_ref, func) = funcs.next().unwrap();
    assert_eq!(
        run_on_function(&module.ctx, *func_ref, func, &cfg, &mut reporter),
        Ok(false)
    );

    let (func_ref, func) = funcs.next().unwrap();
    let fatal = run_on_function(&module.ctx, *func_ref, func, &cfg, &mut reporter).unwrap_err();
    assert_eq!(fatal.count, 4);
    assert_eq!(reporter.error_count(), 4);

    reporter.reset();
    assert_eq!(reporter.error_count(), 0);
}

#[test]
fn repeated_runs_are_deterministic() {
    let module = two_bad_functions();
    let cfg = VerifierConfig::default();
    let mut reporter = ErrorReporter::new(0);

    let mut runs = Vec::new();
    for _ in 0..3 {
        for (func_ref, func) in &module.funcs {
            run_on_function(&module.ctx, *func_ref, func, &cfg, &mut reporter).unwrap();
        }
        let mut out = Vec::new();
        reporter.print_errors(&mut out).unwrap();
        runs.push(String::from_utf8(out).unwrap());
        reporter.reset();
    }

    assert!(runs.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(runs[0].lines().count(), 6);

    let fingerprints: Vec<_> = (0..3)
        .map(|_| diagnostic_fingerprint(&verify(&module)))
        .collect();
    assert!(fingerprints.windows(2).all(|pair| pair[0] == pair[1]));
    assert!(fingerprints[0][0].starts_with("ABI0100|"));
}

#[test]
fn function_report_matches_module_report() {
    let module = two_bad_functions();
    let cfg = VerifierConfig::default();
    let (func_ref, func) = module
        .funcs
        .iter()
        .find(|(func_ref, _)| module.ctx.func_sig(**func_ref).name() == "first")
        .unwrap();

    let report = verify_function(&module.ctx, *func_ref, func, &cfg);
    assert_eq!(
        reasons(&report),
        [Reason::InvalidIntArithmeticType, Reason::BannedOpcode]
    );
    assert_eq!(report.diagnostics[..], verify(&module).diagnostics[..2]);
}

#[test]
fn debug_macro_accepts_clean_module() {
    let mut mb = TestModuleBuilder::new();
    let mut builder = mb.func_builder(&[Type::I32], Type::I32);
    let arg = builder.args()[0];
    let one = builder.make_imm_value(1i32);
    let sum = builder.binary(Opcode::Add, arg, one);
    builder.ret(Some(sum));
    builder.finish().unwrap();

    let module = mb.build();
    pnacl_verifier::debug_verify_module!(&module);
}
