use mcwire::{
    nbt::{self, List},
    ping, Codec, Field, McWireError, NbtTagType, Payload, PingOptions, Record, Rule, Schema, Tag,
    Value,
};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn main() -> Result<(), McWireError> {
    // 构造一个简单的玩家数据NBT
    println!("创建示例NBT...");
    let output_path = Path::new("simple_example.dat");
    let player = Tag::compound(
        "Player",
        vec![
            Tag::new("Name", Payload::String("Steve".to_string())),
            Tag::new("Health", Payload::Float(20.0)),
            Tag::new(
                "Pos",
                Payload::List(List::new(
                    NbtTagType::Double,
                    vec![Payload::Double(0.5), Payload::Double(64.0), Payload::Double(-12.5)],
                )),
            ),
            Tag::new("Seeds", Payload::LongArray(vec![1, 2, 3])),
        ],
    );

    println!("保存到文件: {}", output_path.display());
    nbt::write_compressed(File::create(output_path)?, &player)?;

    let loaded = nbt::read_compressed(BufReader::new(File::open(output_path)?))?;
    println!("读回: {}", loaded);
    std::fs::remove_file(output_path)?;

    // 声明式字段表：长度前缀由编码器计算
    let schema = Schema::new(
        "Greeting",
        vec![
            Field::new("len", Codec::VarInt).computed(Rule::ByteLength("text")),
            Field::new("text", Codec::string()).length_from(Rule::Value("len")),
            Field::new("flags", Codec::optional(Codec::UByte)),
        ],
    );
    let record = Record::new()
        .with("text", "你好")
        .with("flags", Value::UByte(3));
    let bytes = schema.encode(&record)?;
    println!("编码结果: {:02x?}", bytes);
    println!("解码结果: {:?}", schema.decode(&bytes)?);

    // 有参数时对服务器执行Ping
    if let Some(host) = std::env::args().nth(1) {
        match ping(&host, 25565, &PingOptions::default()) {
            Some(response) => println!(
                "{} ({}) - {}/{} 玩家",
                response.motd, response.era, response.online, response.max
            ),
            None => println!("{} 无响应", host),
        }
    }

    Ok(())
}
