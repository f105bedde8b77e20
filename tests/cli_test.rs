use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile;

type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const SAMPLE_TEXT: &[u8] = b"\
To be, or not to be, that is the question:
Whether 'tis nobler in the mind to suffer
The slings and arrows of outrageous fortune,
Or to take arms against a sea of troubles
And by opposing end them. To die, to sleep...
To be, or not to be, that is the question:";

#[test]
fn lzw_compress_then_expand_round_trips() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sample.txt");
    let cmp_path = temp_dir.path().join("sample.Z");
    let out_path = temp_dir.path().join("sample.out");
    std::fs::write(&in_path, SAMPLE_TEXT)?;

    Command::cargo_bin("lzwfuzz")?
        .arg("compress").arg("-m").arg("lzw")
        .arg("-i").arg(&in_path).arg("-o").arg(&cmp_path)
        .assert().success();

    let compressed = std::fs::read(&cmp_path)?;
    assert_eq!(&compressed[0..2], &[0x1F, 0x9D]);
    assert!(compressed.len() < SAMPLE_TEXT.len());

    Command::cargo_bin("lzwfuzz")?
        .arg("expand").arg("-m").arg("lzw")
        .arg("-i").arg(&cmp_path).arg("-o").arg(&out_path)
        .assert().success();

    assert_eq!(std::fs::read(&out_path)?, SAMPLE_TEXT);
    Ok(())
}

#[test]
fn lzw_rejects_unknown_method() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sample.txt");
    let out_path = temp_dir.path().join("sample.out");
    std::fs::write(&in_path, SAMPLE_TEXT)?;

    Command::cargo_bin("lzwfuzz")?
        .arg("compress").arg("-m").arg("not-a-method")
        .arg("-i").arg(&in_path).arg("-o").arg(&out_path)
        .assert().failure();
    Ok(())
}

#[test]
fn hash_then_cmp_self_matches() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sample.txt");
    std::fs::write(&in_path, SAMPLE_TEXT.repeat(50))?;

    let output = Command::cargo_bin("lzwfuzz")?
        .arg("hash").arg("-i").arg(&in_path)
        .output()?;
    assert!(output.status.success());
    let sig = String::from_utf8(output.stdout)?.trim().to_string();
    assert!(sig.contains(':'));

    Command::cargo_bin("lzwfuzz")?
        .arg("cmp").arg("-a").arg(&sig).arg("-b").arg(&sig)
        .assert()
        .success()
        .stdout(predicate::str::contains("100"));
    Ok(())
}

#[test]
fn cmp_rejects_malformed_signature() -> STDRESULT {
    Command::cargo_bin("lzwfuzz")?
        .arg("cmp").arg("-a").arg("garbage").arg("-b").arg("3:abc:def")
        .assert().failure();
    Ok(())
}
