//! End-to-end merge scenarios.
//!
//! These tests drive the engine through the library API with inline
//! manifests and compare the diagnostics in their stable textual form.

use manifestmerge::{read_document, write_document, Document, MergeEngine};

fn doc(file_id: &str, source: &str) -> Document {
    read_document(file_id, source).unwrap()
}

// ============================================================================
// Identical duplicates and appends
// ============================================================================

#[test]
fn test_identical_duplicate_is_skipped_and_alias_appended() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.example.app">
    <application android:name="com.example.TheApp">
        <activity android:name="com.example.LibActivity"
            android:theme="@style/Lib.Theme" />
    </application>
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application>
        <activity android:name="com.example.LibActivity"
            android:theme="@style/Lib.Theme" />
        <!-- The alias for the library activity. -->
        <activity-alias android:name="com.example.LibAlias" />
    </application>
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    let success = engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]);

    assert!(success);
    assert_eq!(
        engine.report().render_lines(),
        vec![
            "P [main.xml:4, lib1.xml:3] Skipping identical \
             /manifest/application/activity[@name=com.example.LibActivity] element."
                .to_string()
        ]
    );

    let merged = write_document(&primary);
    // The duplicate changed nothing.
    assert_eq!(merged.matches("com.example.LibActivity").count(), 1);
    // The alias arrived with its comment block, behind the library marker.
    assert!(merged.contains(
        "<!-- from @lib1.xml -->\n        \
         <!-- The alias for the library activity. -->\n        \
         <activity-alias android:name=\"com.example.LibAlias\" />"
    ));
}

// ============================================================================
// Incompatible elements
// ============================================================================

#[test]
fn test_service_conflict_reports_child_diff() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application android:name="com.example.TheApp">
        <service android:name="com.example.AppService2" />
    </application>
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application>
        <service android:name="com.example.AppService2">
            <intent-filter />
        </service>
    </application>
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    let success = engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]);

    assert!(!success);
    assert_eq!(
        engine.report().render_lines(),
        vec![
            "E [main.xml:3, lib1.xml:3] Trying to merge incompatible \
             /manifest/application/service[@name=com.example.AppService2] element:\n\
             <service android:name=com.example.AppService2>\n\
             --  <intent-filter>\n\
             ++  (end reached)"
                .to_string()
        ]
    );

    // The main manifest is left untouched on conflict.
    assert_eq!(write_document(&primary), main_src);
}

#[test]
fn test_attribute_diff_layout() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application android:name="com.example.TheApp">
        <activity android:icon="@drawable/icon" android:label="@string/lib_activity" android:name="com.example.LibActivity" />
    </application>
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application>
        <activity android:icon="@drawable/icon" android:label="@string/lib_activity" android:name="com.example.LibActivity" android:theme="@style/Lib.Theme" />
    </application>
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    let success = engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]);

    assert!(!success);
    assert_eq!(
        engine.report().render_lines(),
        vec![
            "E [main.xml:3, lib1.xml:3] Trying to merge incompatible \
             /manifest/application/activity[@name=com.example.LibActivity] element:\n\
             <activity android:name=com.example.LibActivity>\n      \
             @android:icon = @drawable/icon\n      \
             @android:label = @string/lib_activity\n      \
             @android:name = com.example.LibActivity\n\
             --    @android:theme = @style/Lib.Theme"
                .to_string()
        ]
    );
}

// ============================================================================
// uses-library required escalation
// ============================================================================

#[test]
fn test_uses_library_required_escalation() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application android:name="com.example.TheApp">
        <uses-library android:name="SomeLibrary3_RequiredFalse" android:required="false" />
        <uses-library android:name="SomeLibrary3_RequiredFalse" android:required="false" />
        <uses-library android:name="SomeLibrary6_RequiredFalse" android:required="false" />
    </application>
</manifest>
"#;
    let lib1_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application>
        <uses-library android:name="SomeLibrary3_RequiredFalse" android:required="false" />
        <uses-library android:name="SomeLibrary6_RequiredFalse" android:required="false" />
    </application>
</manifest>
"#;
    let lib2_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application>
        <uses-library android:name="SomeLibrary3_RequiredFalse" android:required="true" />
        <uses-library android:name="SomeLibrary6_RequiredFalse" />
    </application>
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    let success = engine.merge(
        &mut primary,
        &[doc("lib1.xml", lib1_src), doc("lib2.xml", lib2_src)],
    );

    assert!(success);

    // One duplicate warning per library merge that touches the doubled key.
    let lines = engine.report().render_lines();
    assert_eq!(
        lines,
        vec![
            "W [main.xml:3, lib1.xml:3] Main manifest has more than one \
             /manifest/application/uses-library[@name=SomeLibrary3_RequiredFalse] element."
                .to_string(),
            "W [main.xml:3, lib2.xml:3] Main manifest has more than one \
             /manifest/application/uses-library[@name=SomeLibrary3_RequiredFalse] element."
                .to_string(),
        ]
    );

    // Every required="false" was escalated to true by library 2.
    let merged = write_document(&primary);
    assert_eq!(merged.matches("android:required=\"true\"").count(), 3);
    assert_eq!(merged.matches("android:required=\"false\"").count(), 0);
}

// ============================================================================
// uses-sdk
// ============================================================================

#[test]
fn test_min_sdk_version_conflict_with_default() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-sdk android:targetSdkVersion="14" />
    <application android:name="com.example.TheApp" />
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-sdk android:minSdkVersion="4" />
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    let success = engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]);

    assert!(!success);
    assert_eq!(
        engine.report().render_lines(),
        vec![
            "E [main.xml:2, lib1.xml:2] Main manifest has \
             <uses-sdk android:minSdkVersion='1'> but library uses minSdkVersion='4'"
                .to_string(),
            "W [main.xml:2] Note: main manifest lacks a <uses-sdk android:minSdkVersion> \
             declaration, which defaults to value 1."
                .to_string(),
        ]
    );

    // The main manifest's declaration is never rewritten.
    assert_eq!(write_document(&primary), main_src);
}

#[test]
fn test_min_sdk_version_satisfied_is_silent() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-sdk android:minSdkVersion="8" />
    <application android:name="com.example.TheApp" />
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-sdk android:minSdkVersion="3" />
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    assert!(engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]));
    assert!(engine.report().is_empty());
    assert_eq!(write_document(&primary), main_src);
}

#[test]
fn test_unparsable_min_sdk_version() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-sdk android:minSdkVersion="8" />
    <application android:name="com.example.TheApp" />
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-sdk android:minSdkVersion="abcd" />
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    let success = engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]);

    assert!(!success);
    assert_eq!(
        engine.report().render_lines(),
        vec![
            "E [lib1.xml:2] Failed to parse <uses-sdk android:minSdkVersion='abcd'>: \
             must be an integer number."
                .to_string()
        ]
    );
}

// ============================================================================
// uses-feature / glEsVersion
// ============================================================================

#[test]
fn test_gl_es_version_stripped_on_append() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application android:name="com.example.TheApp" />
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-feature android:name="com.example.feature.X" android:required="false" android:glEsVersion="0x00020001" />
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    let success = engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]);

    assert!(success);
    assert_eq!(
        engine.report().render_lines(),
        vec![
            "W [main.xml, lib1.xml:2] Main manifest has \
             <uses-feature android:glEsVersion='0x00010000'> but library uses \
             glEsVersion='0x00020001'"
                .to_string(),
            "W [main.xml] Note: main manifest lacks a <uses-feature android:glEsVersion> \
             declaration, which defaults to value 0x00010000."
                .to_string(),
        ]
    );

    let merged = write_document(&primary);
    // Appended with glEsVersion stripped, required preserved verbatim.
    assert!(merged.contains(
        "<uses-feature android:name=\"com.example.feature.X\" android:required=\"false\" />"
    ));
    assert!(!merged.contains("glEsVersion"));
}

#[test]
fn test_gl_es_version_only_feature_is_never_appended() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-feature android:glEsVersion="0x00020000" />
    <application android:name="com.example.TheApp" />
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-feature android:glEsVersion="0x00010001" />
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    assert!(engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]));

    // Satisfied by the main declaration: silent, nothing appended.
    assert!(engine.report().is_empty());
    assert_eq!(write_document(&primary), main_src);
}

#[test]
fn test_gl_es_version_exceeding_declared_main_is_an_error() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-feature android:glEsVersion="0x00010000" />
    <application android:name="com.example.TheApp" />
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-feature android:glEsVersion="0x00020001" />
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    let success = engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]);

    assert!(!success);
    assert_eq!(
        engine.report().render_lines(),
        vec![
            "E [main.xml:2, lib1.xml:2] Main manifest has \
             <uses-feature android:glEsVersion='0x00010000'> but library uses \
             glEsVersion='0x00020001'"
                .to_string()
        ]
    );
    assert_eq!(write_document(&primary), main_src);
}

#[test]
fn test_invalid_gl_es_version_literal() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application android:name="com.example.TheApp" />
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-feature android:glEsVersion="131072" />
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    let success = engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]);

    assert!(!success);
    assert_eq!(
        engine.report().render_lines(),
        vec![
            "E [lib1.xml:2] Failed to parse <uses-feature android:glEsVersion='131072'>: \
             must be an integer in the form 0x00020001."
                .to_string()
        ]
    );
}

#[test]
fn test_gl_es_version_below_one_is_ignored_with_warning() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application android:name="com.example.TheApp" />
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-feature android:glEsVersion="0x0000ffff" />
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    assert!(engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]));
    assert_eq!(
        engine.report().render_lines(),
        vec![
            "W [lib1.xml:2] Ignoring <uses-feature android:glEsVersion='0x0000ffff'> \
             because it's smaller than 1.0."
                .to_string()
        ]
    );
}

// ============================================================================
// uses-permission
// ============================================================================

#[test]
fn test_uses_permission_union() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-permission android:name="android.permission.INTERNET" />
    <application android:name="com.example.TheApp" />
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-permission android:name="android.permission.INTERNET" />
    <uses-permission android:name="android.permission.WAKE_LOCK" />
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    assert!(engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]));
    assert!(engine.report().is_empty());

    let merged = write_document(&primary);
    assert_eq!(merged.matches("android.permission.INTERNET").count(), 1);
    assert_eq!(merged.matches("android.permission.WAKE_LOCK").count(), 1);
}

#[test]
fn test_uses_library_missing_name_is_an_error() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application android:name="com.example.TheApp" />
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application>
        <uses-library android:required="true" />
    </application>
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    let success = engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]);

    assert!(!success);
    assert_eq!(
        engine.report().render_lines(),
        vec![
            "E [lib1.xml:3] Undefined 'name' attribute in \
             /manifest/application/uses-library element."
                .to_string()
        ]
    );
}

#[test]
fn test_invalid_required_literal_is_treated_as_true() {
    let main_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application android:name="com.example.TheApp">
        <uses-library android:name="SomeLibrary" android:required="false" />
    </application>
</manifest>
"#;
    let lib_src = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <application>
        <uses-library android:name="SomeLibrary" android:required="maybe" />
    </application>
</manifest>
"#;

    let mut primary = doc("main.xml", main_src);
    let mut engine = MergeEngine::new();
    let success = engine.merge(&mut primary, &[doc("lib1.xml", lib_src)]);

    assert!(success);
    assert_eq!(
        engine.report().render_lines(),
        vec![
            "W [lib1.xml:3] Invalid attribute 'required' in \
             /manifest/application/uses-library[@name=SomeLibrary] element: \
             expected 'true' or 'false' but found 'maybe'."
                .to_string()
        ]
    );

    // Invalid counts as required, so the main entry escalates.
    assert!(write_document(&primary).contains("android:required=\"true\""));
}
