//! Slice orchestration: turns a thin or universal file into a descriptor.

use tracing::{debug, info, warn};

use super::model::{
    ArchitectureRecord, DylibIdentity, LibraryDescriptor, ParseReport, Platform, Warning,
};
use super::symbols::{sort_reexports, SymbolClassifier, WeakSymbolPolicy};
use crate::error::{Error, Result};
use crate::macho::{ContainerKind, FatContext, MachOContext};

/// Result of parsing one slice.
#[derive(Debug)]
pub struct SliceOutput {
    /// Classified exports
    pub record: ArchitectureRecord,
    /// Identity from the last LC_ID_DYLIB, or defaults
    pub identity: DylibIdentity,
    /// Commands that were skipped
    pub warnings: Vec<Error>,
}

/// Parses a thin or universal file with no weak-symbol detection.
pub fn parse_library(data: &[u8], platform: Platform) -> Result<ParseReport> {
    parse_library_with_policy(data, platform, &SymbolClassifier::new())
}

/// Parses a thin or universal file with the given classifier.
///
/// Universal slices that fail are recorded as warnings and skipped. The
/// call fails only if the container is not recognized or no slice
/// survives. The identity of the last surviving slice wins.
pub fn parse_library_with_policy<P: WeakSymbolPolicy>(
    data: &[u8],
    platform: Platform,
    classifier: &SymbolClassifier<P>,
) -> Result<ParseReport> {
    let mut descriptor = LibraryDescriptor::new(platform);
    let mut warnings = Vec::new();

    let attempted = match ContainerKind::detect(data) {
        ContainerKind::Fat => {
            let fat = FatContext::new(data)?;
            info!("Universal Mach-O");

            for (slice, bytes) in fat.iter_slices() {
                let result = bytes.and_then(|bytes| {
                    let ctx = MachOContext::new(bytes)?;
                    parse_slice(ctx, classifier)
                });
                match result {
                    Ok(output) => {
                        accept_slice(&mut descriptor, &mut warnings, Some(slice.index), output)
                    }
                    Err(error) => warnings.push(Warning {
                        slice: Some(slice.index),
                        arch: None,
                        error,
                    }),
                }
            }

            info!("Arch count: {}", descriptor.archs.len());
            fat.slices.len()
        }
        ContainerKind::Thin { .. } => {
            let ctx = MachOContext::new(data)?;
            match parse_slice(ctx, classifier) {
                Ok(output) => accept_slice(&mut descriptor, &mut warnings, None, output),
                Err(error) => warnings.push(Warning {
                    slice: None,
                    arch: None,
                    error,
                }),
            }
            1
        }
        ContainerKind::Unrecognized(magic) => {
            return Err(Error::malformed(format!(
                "not a Mach-O or universal binary (magic {magic:#010x})"
            )));
        }
    };

    for warning in &warnings {
        warn!("{}", warning);
    }

    if descriptor.archs.is_empty() {
        return Err(Error::NoArchitectures { attempted });
    }

    Ok(ParseReport {
        descriptor,
        warnings,
    })
}

/// Adds a parsed slice to the descriptor.
fn accept_slice(
    descriptor: &mut LibraryDescriptor,
    warnings: &mut Vec<Warning>,
    slice: Option<usize>,
    output: SliceOutput,
) {
    let arch = output.record.name.clone();
    warnings.extend(output.warnings.into_iter().map(|error| Warning {
        slice,
        arch: Some(arch.clone()),
        error,
    }));
    descriptor.archs.push(output.record);
    descriptor.set_identity(output.identity);
}

/// Runs architecture identification, the load-command walk and symbol
/// classification for one thin image.
pub fn parse_slice<P: WeakSymbolPolicy>(
    mut ctx: MachOContext<'_>,
    classifier: &SymbolClassifier<P>,
) -> Result<SliceOutput> {
    let arch = ctx.architecture()?;
    info!("{} bit {} slice", ctx.bits, arch);

    let symbols = ctx.symbols()?;
    let classified = classifier.classify_all(&symbols);
    debug!(
        "{}: {} symbols, {} classes, {} ivars from {} entries",
        arch,
        classified.symbols.len(),
        classified.classes.len(),
        classified.ivars.len(),
        symbols.len()
    );

    let mut reexports: Vec<String> = ctx.reexports().map(str::to_string).collect();
    sort_reexports(&mut reexports);

    let identity = ctx
        .dylib_id()
        .map(|(name, current, compat)| DylibIdentity {
            install_name: name.to_string(),
            current_version: current.to_string(),
            compatibility_version: compat.to_string(),
        })
        .unwrap_or_default();

    Ok(SliceOutput {
        record: ArchitectureRecord {
            name: arch.name().to_string(),
            symbols: classified.symbols,
            classes: classified.classes,
            ivars: classified.ivars,
            weak: classified.weak,
            reexports,
        },
        identity,
        warnings: std::mem::take(&mut ctx.warnings),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macho::*;
    use crate::test_support::{fat_binary, ImageBuilder};

    fn foundation_like() -> ImageBuilder {
        ImageBuilder::arm64()
            .id_dylib("/System/Library/Frameworks/Foo.framework/Foo", 0x0002_3000, 0x0001_0000)
            .reexport("/usr/lib/libobjc.A.dylib")
            .reexport("/usr/lib/system/libsystem_kernel.dylib")
            .reexport("/usr/lib/libz.1.dylib")
            .export("_FooMakeThing")
            .export("_FooBar")
            .export("_OBJC_CLASS_$_FooObject")
            .export("_OBJC_METACLASS_$_FooObject")
            .export("_OBJC_IVAR_$_FooObject._count")
            .export("_OBJC_CLASS_$_FooArray")
            .symbol("_private_helper", N_SECT)
            .symbol("_objc_msgSend", N_UNDF | N_EXT)
    }

    #[test]
    fn test_thin_pipeline() {
        let data = foundation_like().build();
        let report = parse_library(&data, Platform::Ios).unwrap();
        let desc = &report.descriptor;

        assert!(report.warnings.is_empty());
        assert_eq!(desc.platform, Platform::Ios);
        assert_eq!(desc.install_name, "/System/Library/Frameworks/Foo.framework/Foo");
        assert_eq!(desc.current_version, "2.48.0");
        assert_eq!(desc.compatibility_version, "1.0.0");

        assert_eq!(desc.archs.len(), 1);
        let arch = &desc.archs[0];
        assert_eq!(arch.name, "arm64");
        assert_eq!(arch.symbols, ["_FooBar", "_FooMakeThing"]);
        assert_eq!(arch.classes, ["_FooArray", "_FooObject"]);
        assert_eq!(arch.ivars, ["_FooObject._count"]);
        assert!(arch.weak.is_empty());
        assert_eq!(
            arch.reexports,
            [
                "/usr/lib/system/libsystem_kernel.dylib",
                "/usr/lib/libobjc.A.dylib",
                "/usr/lib/libz.1.dylib",
            ]
        );
    }

    #[test]
    fn test_duplicate_reexports_kept() {
        let data = ImageBuilder::x86_64()
            .reexport("/usr/lib/libA.dylib")
            .reexport("/usr/lib/libA.dylib")
            .build();
        let report = parse_library(&data, Platform::Macosx).unwrap();
        assert_eq!(report.descriptor.archs[0].reexports.len(), 2);
    }

    #[test]
    fn test_no_id_uses_defaults() {
        let data = ImageBuilder::x86_64().export("_f").build();
        let report = parse_library(&data, Platform::Macosx).unwrap();
        assert_eq!(report.descriptor.install_name, "");
        assert_eq!(report.descriptor.current_version, "275.0");
        assert_eq!(report.descriptor.compatibility_version, "");
    }

    #[test]
    fn test_fat_skips_unsupported_slice() {
        let ppc = ImageBuilder::new(CPU_TYPE_POWERPC, 0)
            .big_endian()
            .bits32()
            .export("_ppc")
            .build();
        let arm64 = foundation_like().build();
        let data = fat_binary(&[
            (CPU_TYPE_POWERPC, 0, ppc),
            (CPU_TYPE_ARM64, CPU_SUBTYPE_ARM64_ALL, arm64),
        ]);

        let report = parse_library(&data, Platform::Ios).unwrap();
        assert_eq!(report.descriptor.archs.len(), 1);
        assert_eq!(report.descriptor.archs[0].name, "arm64");

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].slice, Some(0));
        assert!(matches!(
            report.warnings[0].error,
            Error::UnsupportedArchitecture {
                cputype: CPU_TYPE_POWERPC,
                ..
            }
        ));
    }

    #[test]
    fn test_fat_slice_order_and_last_identity_wins() {
        let armv7 = ImageBuilder::armv7()
            .id_dylib("/usr/lib/libv7.dylib", 0x0001_0000, 0x0001_0000)
            .export("_v7")
            .build();
        let arm64 = ImageBuilder::arm64()
            .id_dylib("/usr/lib/lib64.dylib", 0x0002_0000, 0x0001_0000)
            .export("_v8")
            .build();
        let data = fat_binary(&[
            (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7, armv7),
            (CPU_TYPE_ARM64, CPU_SUBTYPE_ARM64_ALL, arm64),
        ]);

        let report = parse_library(&data, Platform::Ios).unwrap();
        let names: Vec<_> = report.descriptor.arch_names().collect();
        assert_eq!(names, ["armv7", "arm64"]);
        assert_eq!(report.descriptor.install_name, "/usr/lib/lib64.dylib");
        assert_eq!(report.descriptor.current_version, "2.0.0");
    }

    #[test]
    fn test_fat_failed_last_slice_does_not_overwrite_identity() {
        let arm64 = ImageBuilder::arm64()
            .id_dylib("/usr/lib/libgood.dylib", 0x0001_0000, 0x0001_0000)
            .build();
        let armv7k = ImageBuilder::new(CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7K)
            .bits32()
            .id_dylib("/usr/lib/libwatch.dylib", 0x0009_0000, 0x0001_0000)
            .build();
        let data = fat_binary(&[
            (CPU_TYPE_ARM64, CPU_SUBTYPE_ARM64_ALL, arm64),
            (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7K, armv7k),
        ]);

        let report = parse_library(&data, Platform::Ios).unwrap();
        assert_eq!(report.descriptor.install_name, "/usr/lib/libgood.dylib");
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_fat_slice_out_of_bounds_skipped() {
        let x86 = ImageBuilder::x86_64().export("_x").build();
        let arm64 = ImageBuilder::arm64().export("_a").build();
        let mut data = fat_binary(&[
            (CPU_TYPE_X86_64, CPU_SUBTYPE_X86_ALL, x86),
            (CPU_TYPE_ARM64, CPU_SUBTYPE_ARM64_ALL, arm64),
        ]);
        let len = data.len();
        data.truncate(len - 1);

        let report = parse_library(&data, Platform::Macosx).unwrap();
        assert_eq!(report.descriptor.archs.len(), 1);
        assert_eq!(report.descriptor.archs[0].name, "x86_64");
        assert!(matches!(
            report.warnings[0].error,
            Error::SliceOutOfBounds { index: 1, .. }
        ));
    }

    #[test]
    fn test_fat_bad_string_index_drops_only_that_slice() {
        let armv7 = ImageBuilder::armv7()
            .id_dylib("/usr/lib/libbad.dylib", 0x0009_0000, 0x0001_0000)
            .export("_ok")
            .export_at_strx(0x4000)
            .build();
        let arm64 = ImageBuilder::arm64()
            .id_dylib("/usr/lib/libgood.dylib", 0x0001_0000, 0x0001_0000)
            .export("_ok")
            .build();
        let data = fat_binary(&[
            (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7, armv7),
            (CPU_TYPE_ARM64, CPU_SUBTYPE_ARM64_ALL, arm64),
        ]);

        let report = parse_library(&data, Platform::Ios).unwrap();
        let desc = &report.descriptor;
        assert_eq!(desc.arch_names().collect::<Vec<_>>(), ["arm64"]);
        assert_eq!(desc.install_name, "/usr/lib/libgood.dylib");
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].slice, Some(0));
        assert!(matches!(
            report.warnings[0].error,
            Error::StringTableOverflow { offset: 0x4000, .. }
        ));
    }

    #[test]
    fn test_fat_with_no_usable_slice() {
        let ppc = ImageBuilder::new(CPU_TYPE_POWERPC, 0).bits32().big_endian().build();
        let data = fat_binary(&[(CPU_TYPE_POWERPC, 0, ppc)]);
        let err = parse_library(&data, Platform::Ios).unwrap_err();
        assert!(matches!(err, Error::NoArchitectures { attempted: 1 }));
    }

    #[test]
    fn test_unrecognized_magic_is_malformed() {
        let err = parse_library(b"\x7fELF\x02\x01\x01\0", Platform::Ios).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));

        let err = parse_library(&[], Platform::Ios).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }

    #[test]
    fn test_thin_unsupported_arch_fails() {
        let data = ImageBuilder::new(CPU_TYPE_ARM, 0).bits32().export("_x").build();
        let err = parse_library(&data, Platform::Ios).unwrap_err();
        assert!(matches!(err, Error::NoArchitectures { attempted: 1 }));
    }

    #[test]
    fn test_truncated_command_reported_with_arch() {
        let data = ImageBuilder::arm64()
            .raw_command(LC_ID_DYLIB, 12, &[0u8; 4])
            .reexport("/usr/lib/libre.dylib")
            .export("_kept")
            .build();

        let report = parse_library(&data, Platform::Ios).unwrap();
        assert_eq!(report.descriptor.archs[0].symbols, ["_kept"]);
        assert_eq!(report.descriptor.archs[0].reexports, ["/usr/lib/libre.dylib"]);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].arch.as_deref(), Some("arm64"));
        assert!(matches!(report.warnings[0].error, Error::TruncatedCommand { .. }));
    }

    #[test]
    fn test_big_endian_slice_through_pipeline() {
        let data = ImageBuilder::new(CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V6)
            .bits32()
            .big_endian()
            .id_dylib("/usr/lib/libbe.dylib", 0x0001_0203, 0x0001_0000)
            .export("_b")
            .export("_a")
            .build();

        let report = parse_library(&data, Platform::Ios).unwrap();
        assert_eq!(report.descriptor.archs[0].name, "armv6");
        assert_eq!(report.descriptor.archs[0].symbols, ["_a", "_b"]);
        assert_eq!(report.descriptor.current_version, "1.2.3");
    }

    #[test]
    fn test_weak_policy_seam() {
        struct AllWeak;
        impl WeakSymbolPolicy for AllWeak {
            fn is_weak(&self, _symbol: &SymbolEntry) -> bool {
                true
            }
        }

        let data = ImageBuilder::arm64()
            .export("_w")
            .export("_OBJC_CLASS_$_C")
            .build();
        let classifier = SymbolClassifier::with_policy(AllWeak);
        let report = parse_library_with_policy(&data, Platform::Ios, &classifier).unwrap();

        let arch = &report.descriptor.archs[0];
        assert_eq!(arch.weak, ["_w"]);
        assert!(arch.symbols.is_empty());
        assert_eq!(arch.classes, ["_C"]);
    }
}
