//! Integration tests for the verify-link-execute pipeline
//!
//! Each test drives the full path a host would: build a parsed module,
//! instantiate it against providers (other instances or host values),
//! and observe exports. Rejection tests assert the precise stage that
//! fails: contract extraction, body verification, or linking.

use std::sync::Arc;

use module::{
    BinOp, FuncType, Instr, MemoryType, Module, ModuleBuilder, NumKind, ValueType,
};
use runtime::{Extern, Func, Imports, InstantiateError, Instance, LinkError, Memory, Value};
use verifier::Violation;

fn instantiate_standalone(module: &Module) -> Instance {
    runtime::instantiate(module, &Imports::new()).expect("instantiation failed")
}

/// `add(a, b)` over the given value type, exported as "add".
fn add_module(ty: ValueType) -> Module {
    ModuleBuilder::new()
        .func(
            FuncType::new(vec![ty, ty], vec![ty]),
            vec![],
            vec![
                Instr::LocalGet(0),
                Instr::LocalGet(1),
                Instr::Binary {
                    op: BinOp::Add,
                    kind: ty.kind,
                },
            ],
        )
        .export_func("add", 0)
        .build()
}

#[test]
fn test_public_sum() {
    let instance = instantiate_standalone(&add_module(ValueType::I32));
    let results = instance
        .invoke("add", &[Value::I32(1), Value::I32(2)])
        .unwrap();
    assert_eq!(results, vec![Value::I32(3)]);
}

#[test]
fn test_secret_sum() {
    let module = ModuleBuilder::new()
        .func(
            FuncType::new(vec![ValueType::S32, ValueType::S32], vec![ValueType::S32]),
            vec![],
            vec![
                Instr::LocalGet(0),
                Instr::LocalGet(1),
                Instr::Binary {
                    op: BinOp::Add,
                    kind: NumKind::I32,
                },
            ],
        )
        .func(
            FuncType::new(vec![ValueType::S32], vec![ValueType::S32]),
            vec![],
            vec![
                Instr::LocalGet(0),
                Instr::S32Const(1),
                Instr::Binary {
                    op: BinOp::Add,
                    kind: NumKind::I32,
                },
            ],
        )
        .export_func("add", 0)
        .export_func("add_one", 1)
        .build();

    let instance = instantiate_standalone(&module);
    assert_eq!(
        instance.invoke("add", &[Value::I32(3), Value::I32(4)]),
        Ok(vec![Value::I32(7)])
    );
    assert_eq!(
        instance.invoke("add_one", &[Value::I32(5)]),
        Ok(vec![Value::I32(6)])
    );
}

#[test]
fn test_secret_i64_sum() {
    let instance = instantiate_standalone(&add_module(ValueType::S64));
    assert_eq!(
        instance.invoke("add", &[Value::I64(3), Value::I64(4)]),
        Ok(vec![Value::I64(7)])
    );
}

/// Library owning a secret memory: load/store at address zero, memory
/// exported for clients.
fn secret_memory_lib() -> Module {
    ModuleBuilder::new()
        .memory(MemoryType::new(1, None).secret())
        .func(
            FuncType::new(vec![], vec![ValueType::S32]),
            vec![],
            vec![Instr::I32Const(0), Instr::Load { kind: NumKind::I32 }],
        )
        .func(
            FuncType::new(vec![], vec![]),
            vec![],
            vec![
                Instr::I32Const(0),
                Instr::S32Const(2),
                Instr::Store { kind: NumKind::I32 },
            ],
        )
        .export_func("load_at_zero", 0)
        .export_func("store_at_zero", 1)
        .export_memory("mem")
        .build()
}

/// Client importing a memory of the given type under `lib`.`mem`.
fn memory_client(ty: MemoryType) -> Module {
    ModuleBuilder::new()
        .import_memory("lib", "mem", ty)
        .func(
            FuncType::new(vec![], vec![ValueType::new(NumKind::I32, ty.sec)]),
            vec![],
            vec![Instr::I32Const(0), Instr::Load { kind: NumKind::I32 }],
        )
        .export_func("peek", 0)
        .build()
}

#[test]
fn test_secret_memory_store_load_round_trip() {
    let lib = instantiate_standalone(&secret_memory_lib());

    assert_eq!(lib.invoke("load_at_zero", &[]), Ok(vec![Value::I32(0)]));
    assert_eq!(lib.invoke("store_at_zero", &[]), Ok(vec![]));
    assert_eq!(lib.invoke("load_at_zero", &[]), Ok(vec![Value::I32(2)]));

    // The host sees the stored word through the exported memory.
    let memory = lib.get_memory("mem").expect("memory export");
    assert_eq!(memory.read_u32(0), Ok(2));
}

#[test]
fn test_memory_secrecy_contract_enforced_at_link_in_both_directions() {
    let secret_lib = instantiate_standalone(&secret_memory_lib());
    let mut from_secret = Imports::new();
    from_secret.define_instance("lib", &secret_lib);

    // A secret-expecting client binds the secret provider.
    assert!(runtime::instantiate(&memory_client(MemoryType::new(1, None).secret()), &from_secret).is_ok());

    // A public-expecting client must not.
    match runtime::instantiate(&memory_client(MemoryType::new(1, None)), &from_secret) {
        Err(InstantiateError::Link(LinkError::Incompatible { module, name, .. })) => {
            assert_eq!((module.as_str(), name.as_str()), ("lib", "mem"));
        }
        other => panic!("public client bound a secret memory: {other:?}"),
    }

    // Symmetric direction: secret-expecting client, public provider.
    let public_lib = instantiate_standalone(
        &ModuleBuilder::new()
            .memory(MemoryType::new(1, None))
            .export_memory("mem")
            .build(),
    );
    let mut from_public = Imports::new();
    from_public.define_instance("lib", &public_lib);
    assert!(matches!(
        runtime::instantiate(&memory_client(MemoryType::new(1, None).secret()), &from_public),
        Err(InstantiateError::Link(LinkError::Incompatible { .. }))
    ));
}

#[test]
fn test_write_through_host_supplied_secret_memory() {
    // The host hands a secret memory to an importing module, the
    // module writes through it, and the host observes the word.
    let memory = Arc::new(Memory::new(MemoryType::new(1, None).secret()));

    let module = ModuleBuilder::new()
        .import_memory("lib", "mem", MemoryType::new(1, None).secret())
        .func(
            FuncType::new(vec![ValueType::I32, ValueType::S32], vec![]),
            vec![],
            vec![
                Instr::LocalGet(0),
                Instr::LocalGet(1),
                Instr::Store { kind: NumKind::I32 },
            ],
        )
        .export_func("write", 0)
        .build();

    let mut imports = Imports::new();
    imports.define("lib", "mem", Extern::Memory(Arc::clone(&memory)));
    let instance = runtime::instantiate(&module, &imports).unwrap();

    instance
        .invoke("write", &[Value::I32(4), Value::I32(67)])
        .unwrap();
    assert_eq!(memory.read_u32(4), Ok(67));
}

#[test]
fn test_host_memory_defaults_to_public() {
    // A descriptor without an explicit tag is public; a
    // secret-expecting import must reject it rather than coerce.
    let memory = Arc::new(Memory::new(MemoryType::new(1, None)));
    let module = ModuleBuilder::new()
        .import_memory("lib", "mem", MemoryType::new(1, None).secret())
        .build();

    let mut imports = Imports::new();
    imports.define("lib", "mem", Extern::Memory(memory));
    assert!(matches!(
        runtime::instantiate(&module, &imports),
        Err(InstantiateError::Link(LinkError::Incompatible { .. }))
    ));
}

/// Client importing `lib`.`add` with the given value type and calling
/// it through an exported wrapper.
fn add_client(ty: ValueType) -> Module {
    ModuleBuilder::new()
        .import_func("lib", "add", FuncType::new(vec![ty, ty], vec![ty]))
        .func(
            FuncType::new(vec![ty, ty], vec![ty]),
            vec![],
            vec![Instr::LocalGet(0), Instr::LocalGet(1), Instr::Call(0)],
        )
        .export_func("call_add", 1)
        .build()
}

#[test]
fn test_function_secrecy_contract_enforced_at_link_in_both_directions() {
    let i32_lib = instantiate_standalone(&add_module(ValueType::I32));
    let s32_lib = instantiate_standalone(&add_module(ValueType::S32));

    let mut from_secret = Imports::new();
    from_secret.define_instance("lib", &s32_lib);
    let mut from_public = Imports::new();
    from_public.define_instance("lib", &i32_lib);

    // Matching secrecy links and runs.
    let client = runtime::instantiate(&add_client(ValueType::S32), &from_secret).unwrap();
    assert_eq!(
        client.invoke("call_add", &[Value::I32(2), Value::I32(3)]),
        Ok(vec![Value::I32(5)])
    );

    // Secret client over a public library: rejected.
    assert!(matches!(
        runtime::instantiate(&add_client(ValueType::S32), &from_public),
        Err(InstantiateError::Link(LinkError::Incompatible { .. }))
    ));

    // Public client over a secret library: rejected.
    assert!(matches!(
        runtime::instantiate(&add_client(ValueType::I32), &from_secret),
        Err(InstantiateError::Link(LinkError::Incompatible { .. }))
    ));
}

fn trusted_lib() -> Module {
    ModuleBuilder::new()
        .func(
            FuncType::new(vec![], vec![ValueType::I32]).trusted(),
            vec![],
            vec![Instr::I32Const(5)],
        )
        .export_func("trusted", 0)
        .build()
}

/// Client whose import declares the given signature and whose wrapper
/// carries the given trust.
fn calling_client(import_ty: FuncType, caller_ty: FuncType) -> Module {
    ModuleBuilder::new()
        .import_func("lib", "trusted", import_ty)
        .func(caller_ty, vec![], vec![Instr::Call(0)])
        .export_func("call_it", 1)
        .build()
}

#[test]
fn test_trusted_import_binds_trusted_export() {
    let lib = instantiate_standalone(&trusted_lib());
    let mut imports = Imports::new();
    imports.define_instance("lib", &lib);

    let client = calling_client(
        FuncType::new(vec![], vec![ValueType::I32]).trusted(),
        FuncType::new(vec![], vec![ValueType::I32]).trusted(),
    );
    let instance = runtime::instantiate(&client, &imports).unwrap();
    assert_eq!(instance.invoke("call_it", &[]), Ok(vec![Value::I32(5)]));
}

#[test]
fn test_trusted_export_never_binds_untrusted_import() {
    // Exact trust matching: offering more trust than declared is as
    // much a contract violation as offering less.
    let lib = instantiate_standalone(&trusted_lib());
    let mut imports = Imports::new();
    imports.define_instance("lib", &lib);

    let client = calling_client(
        FuncType::new(vec![], vec![ValueType::I32]),
        FuncType::new(vec![], vec![ValueType::I32]),
    );
    assert!(matches!(
        runtime::instantiate(&client, &imports),
        Err(InstantiateError::Link(LinkError::Incompatible { .. }))
    ));
}

#[test]
fn test_host_function_never_satisfies_trusted_import() {
    // The host callback's numeric behavior matches the signature
    // exactly; trust is still unobtainable for unverified code.
    let host = Func::wrap_host(FuncType::new(vec![], vec![ValueType::I32]), |_| {
        Ok(vec![Value::I32(5)])
    })
    .unwrap();

    let mut imports = Imports::new();
    imports.define("lib", "trusted", Extern::Func(host));

    let client = calling_client(
        FuncType::new(vec![], vec![ValueType::I32]).trusted(),
        FuncType::new(vec![], vec![ValueType::I32]).trusted(),
    );
    assert!(matches!(
        runtime::instantiate(&client, &imports),
        Err(InstantiateError::Link(LinkError::Incompatible { .. }))
    ));
}

#[test]
fn test_host_function_binds_untrusted_import() {
    let host = Func::wrap_host(FuncType::new(vec![], vec![ValueType::I32]), |_| {
        Ok(vec![Value::I32(9)])
    })
    .unwrap();

    let mut imports = Imports::new();
    imports.define("lib", "trusted", Extern::Func(host));

    let client = calling_client(
        FuncType::new(vec![], vec![ValueType::I32]),
        FuncType::new(vec![], vec![ValueType::I32]),
    );
    let instance = runtime::instantiate(&client, &imports).unwrap();
    assert_eq!(instance.invoke("call_it", &[]), Ok(vec![Value::I32(9)]));
}

#[test]
fn test_host_function_cannot_be_defined_trusted() {
    assert!(matches!(
        Func::wrap_host(
            FuncType::new(vec![], vec![ValueType::I32]).trusted(),
            |_| Ok(vec![Value::I32(5)]),
        ),
        Err(LinkError::HostTrust)
    ));
}

#[test]
fn test_trusted_call_from_trusted_function() {
    let module = ModuleBuilder::new()
        .func(
            FuncType::new(vec![], vec![ValueType::I32]).trusted(),
            vec![],
            vec![Instr::I32Const(5)],
        )
        .func(
            FuncType::new(vec![], vec![ValueType::I32]).trusted(),
            vec![],
            vec![Instr::Call(0)],
        )
        .export_func("invoke_trusted", 1)
        .build();

    let instance = instantiate_standalone(&module);
    assert_eq!(instance.invoke("invoke_trusted", &[]), Ok(vec![Value::I32(5)]));
}

#[test]
fn test_trusted_call_from_untrusted_function_rejected_before_linking() {
    let module = ModuleBuilder::new()
        .func(
            FuncType::new(vec![], vec![ValueType::I32]).trusted(),
            vec![],
            vec![Instr::I32Const(5)],
        )
        .func(
            FuncType::new(vec![], vec![ValueType::I32]),
            vec![],
            vec![Instr::Call(0)],
        )
        .build();

    match runtime::instantiate(&module, &Imports::new()) {
        Err(InstantiateError::Verification(err)) => {
            assert!(matches!(err.violation, Violation::TrustViolation { .. }));
            assert_eq!(err.func, 1);
        }
        other => panic!("expected a trust violation, got {other:?}"),
    }
}

#[test]
fn test_declassify_from_untrusted_function_rejected_before_linking() {
    let module = ModuleBuilder::new()
        .func(
            FuncType::new(vec![ValueType::S32], vec![ValueType::I32]),
            vec![],
            vec![
                Instr::LocalGet(0),
                Instr::Declassify { kind: NumKind::I32 },
            ],
        )
        .build();

    match runtime::instantiate(&module, &Imports::new()) {
        Err(InstantiateError::Verification(err)) => {
            assert!(matches!(err.violation, Violation::TrustViolation { .. }));
        }
        other => panic!("expected a trust violation, got {other:?}"),
    }
}

#[test]
fn test_secret_select_chooses_by_condition() {
    let module = ModuleBuilder::new()
        .func(
            FuncType::new(
                vec![ValueType::S32, ValueType::S32, ValueType::S32],
                vec![ValueType::S32],
            ),
            vec![],
            vec![
                Instr::LocalGet(0),
                Instr::LocalGet(1),
                Instr::LocalGet(2),
                Instr::Select { ty: ValueType::S32 },
            ],
        )
        .export_func("secret_select", 0)
        .build();

    let instance = instantiate_standalone(&module);
    assert_eq!(
        instance.invoke(
            "secret_select",
            &[Value::I32(3), Value::I32(4), Value::I32(1)]
        ),
        Ok(vec![Value::I32(3)])
    );
    assert_eq!(
        instance.invoke(
            "secret_select",
            &[Value::I32(2), Value::I32(5), Value::I32(0)]
        ),
        Ok(vec![Value::I32(5)])
    );
}

#[test]
fn test_secret_conditioned_select_with_public_result_rejected() {
    // The rejection happens statically, before any call could occur.
    let module = ModuleBuilder::new()
        .func(
            FuncType::new(
                vec![ValueType::I32, ValueType::I32, ValueType::S32],
                vec![ValueType::I32],
            ),
            vec![],
            vec![
                Instr::LocalGet(0),
                Instr::LocalGet(1),
                Instr::LocalGet(2),
                Instr::Select { ty: ValueType::I32 },
            ],
        )
        .export_func("secret_select", 0)
        .build();

    match runtime::instantiate(&module, &Imports::new()) {
        Err(InstantiateError::Verification(err)) => {
            assert!(matches!(err.violation, Violation::SecrecyLeak { .. }));
        }
        other => panic!("expected a secrecy leak, got {other:?}"),
    }
}

#[test]
fn test_instantiation_is_atomic_across_imports() {
    // Three imports; the second is incompatible. The first binding
    // must leave no observable trace and no instance may exist.
    let module = ModuleBuilder::new()
        .import_func(
            "lib",
            "first",
            FuncType::new(vec![], vec![ValueType::I32]),
        )
        .import_memory("lib", "mem", MemoryType::new(1, None).secret())
        .import_func(
            "lib",
            "third",
            FuncType::new(vec![], vec![ValueType::I32]),
        )
        .build();

    let provider_memory = Arc::new(Memory::new(MemoryType::new(1, None)));
    provider_memory.write_u32(0, 41).unwrap();

    let nullary = || {
        Func::wrap_host(FuncType::new(vec![], vec![ValueType::I32]), |_| {
            Ok(vec![Value::I32(1)])
        })
        .unwrap()
    };

    let mut imports = Imports::new();
    imports.define("lib", "first", Extern::Func(nullary()));
    // Public memory against a secret-expecting import: rejected.
    imports.define("lib", "mem", Extern::Memory(Arc::clone(&provider_memory)));
    imports.define("lib", "third", Extern::Func(nullary()));

    match runtime::instantiate(&module, &imports) {
        Err(InstantiateError::Link(LinkError::Incompatible { name, .. })) => {
            assert_eq!(name, "mem");
        }
        other => panic!("expected link rejection on `mem`, got {other:?}"),
    }

    // The provider memory is untouched by the aborted instantiation.
    assert_eq!(provider_memory.read_u32(0), Ok(41));
}

#[test]
fn test_instance_exports_carry_full_contract() {
    let lib = instantiate_standalone(&secret_memory_lib());

    let types: Vec<(&str, String)> = lib
        .export_types()
        .map(|(name, ty)| (name, ty.to_string()))
        .collect();
    assert!(types.contains(&("mem", "secret memory (1.. pages)".to_string())));
    assert!(types.iter().any(|(name, ty)| *name == "load_at_zero" && ty.contains("s32")));
}

#[test]
fn test_missing_provider_reports_import_name() {
    let module = ModuleBuilder::new()
        .import_func("lib", "absent", FuncType::new(vec![], vec![]))
        .build();

    match runtime::instantiate(&module, &Imports::new()) {
        Err(InstantiateError::Link(LinkError::UnknownImport { module, name })) => {
            assert_eq!((module.as_str(), name.as_str()), ("lib", "absent"));
        }
        other => panic!("expected unknown import, got {other:?}"),
    }
}

#[test]
fn test_malformed_contract_reported_before_verification() {
    // Duplicate export name and a body that would also fail
    // verification; the contract failure wins because extraction runs
    // first.
    let module = ModuleBuilder::new()
        .func(
            FuncType::new(vec![], vec![ValueType::I32]),
            vec![],
            vec![Instr::S32Const(1)],
        )
        .export_func("f", 0)
        .export_func("f", 0)
        .build();

    assert!(matches!(
        runtime::instantiate(&module, &Imports::new()),
        Err(InstantiateError::Contract(_))
    ));
}

#[test]
fn test_cyclic_call_graph_traps_on_depth_instead_of_diverging() {
    let module = ModuleBuilder::new()
        .func(
            FuncType::new(vec![], vec![ValueType::I32]),
            vec![],
            vec![Instr::Call(0)],
        )
        .export_func("forever", 0)
        .build();

    let instance = instantiate_standalone(&module);
    assert!(matches!(
        instance.invoke("forever", &[]),
        Err(runtime::Trap::CallStackExhausted { .. })
    ));
}

#[test]
fn test_instances_chain_as_providers() {
    // lib → middle → client: each instance serves the next link.
    let lib = instantiate_standalone(&add_module(ValueType::S32));

    let mut lib_imports = Imports::new();
    lib_imports.define_instance("lib", &lib);
    let middle_module = ModuleBuilder::new()
        .import_func(
            "lib",
            "add",
            FuncType::new(vec![ValueType::S32, ValueType::S32], vec![ValueType::S32]),
        )
        .func(
            FuncType::new(vec![ValueType::S32], vec![ValueType::S32]),
            vec![],
            vec![Instr::LocalGet(0), Instr::S32Const(10), Instr::Call(0)],
        )
        .export_func("add_ten", 1)
        .build();
    let middle = runtime::instantiate(&middle_module, &lib_imports).unwrap();

    let mut middle_imports = Imports::new();
    middle_imports.define_instance("m", &middle);
    let client_module = ModuleBuilder::new()
        .import_func(
            "m",
            "add_ten",
            FuncType::new(vec![ValueType::S32], vec![ValueType::S32]),
        )
        .func(
            FuncType::new(vec![ValueType::S32], vec![ValueType::S32]),
            vec![],
            vec![Instr::LocalGet(0), Instr::Call(0)],
        )
        .export_func("go", 1)
        .build();
    let client = runtime::instantiate(&client_module, &middle_imports).unwrap();

    assert_eq!(client.invoke("go", &[Value::I32(32)]), Ok(vec![Value::I32(42)]));
}
